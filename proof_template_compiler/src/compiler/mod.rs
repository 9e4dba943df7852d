mod dif;
mod indy;
pub mod revocation;

use std::{
    collections::BTreeMap,
    fmt::{Debug, Formatter},
};

use proof_template_types::{
    data_types::{
        identifiers::{ConnectionId, LedgerSchemaId, PartnerId, SchemaRef, TemplateId},
        presentation_definition::{ClaimFormat, PresentationDefinition, ProofTypeSpec},
        proof_request::ProofRequestPayload,
        schema::{CredentialFormat, ResolvedSchema},
        template::{AttributeGroup, ProofTemplate},
    },
    utils::validation::Validatable,
};
use strum_macros::{AsRefStr, EnumString};
use uuid::Uuid;

use self::revocation::{NonRevocationApplicator, RevocationClock, SystemClock};
use crate::{
    errors::error::{CompilerError, CompilerResult},
    resolver::base_resolver::{PartnerDirectoryRead, SchemaRegistryRead, TemplateStoreRead},
};

/// Version field stamped on every legacy request body.
const PROOF_REQUEST_VERSION: &str = "1.0";

/// Fixed namespace for deriving presentation definition ids from template
/// ids, keeping recompilations byte-identical.
const PRESENTATION_NAMESPACE: Uuid = Uuid::from_u128(0x9f0c_9a3b_6d4e_4b1f_8a57_31de_52c6_7e84);

/// Proof suites announced to holders. BBS+ suites let holders derive
/// selective-disclosure presentations.
const LDP_PROOF_TYPES: [&str; 2] = ["BbsBlsSignature2020", "Ed25519Signature2018"];

/// Presentation protocol a template is compiled for.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, AsRefStr, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProofRequestFormat {
    /// Attribute/predicate request maps.
    #[default]
    Indy,
    /// Claims-based presentation definition.
    Dif,
}

impl ProofRequestFormat {
    /// Parses the store-level representation of a format selection.
    pub fn parse(value: &str) -> CompilerResult<Self> {
        value
            .parse()
            .map_err(|_| CompilerError::UnsupportedFormat(value.to_owned()))
    }
}

/// Group excluded from a compiled request because its schema could not be
/// resolved for the requested protocol.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaResolutionGap {
    pub schema_ref: SchemaRef,
    pub reason: String,
}

/// Protocol request compiled from one template for one connection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum CompiledProofRequest {
    Indy {
        connection_id: ConnectionId,
        proof_request: ProofRequestPayload,
    },
    Dif {
        connection_id: ConnectionId,
        presentation_definition: PresentationDefinition,
    },
}

impl CompiledProofRequest {
    #[must_use]
    pub const fn connection_id(&self) -> &ConnectionId {
        match self {
            Self::Indy { connection_id, .. } | Self::Dif { connection_id, .. } => connection_id,
        }
    }
}

/// Successful compilation along with the groups it had to leave out.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompilationOutcome {
    pub request: CompiledProofRequest,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<SchemaResolutionGap>,
}

pub struct TemplateCompilerConfig<T, S, P>
where
    T: TemplateStoreRead,
    S: SchemaRegistryRead,
    P: PartnerDirectoryRead,
{
    pub template_store: T,
    pub schema_registry: S,
    pub partner_directory: P,
    pub clock: Box<dyn RevocationClock>,
}

impl<T, S, P> TemplateCompilerConfig<T, S, P>
where
    T: TemplateStoreRead,
    S: SchemaRegistryRead,
    P: PartnerDirectoryRead,
{
    /// Wires the collaborators with the system wall clock.
    pub fn new(template_store: T, schema_registry: S, partner_directory: P) -> Self {
        Self {
            template_store,
            schema_registry,
            partner_directory,
            clock: Box::new(SystemClock),
        }
    }
}

/// Compiles proof templates into protocol requests for a counterparty
/// connection. Pure transformation: collaborators are read from, nothing is
/// persisted, and no wire IO happens here.
pub struct TemplateCompiler<T, S, P>
where
    T: TemplateStoreRead,
    S: SchemaRegistryRead,
    P: PartnerDirectoryRead,
{
    template_store: T,
    schema_registry: S,
    partner_directory: P,
    clock: Box<dyn RevocationClock>,
}

impl<T, S, P> Debug for TemplateCompiler<T, S, P>
where
    T: TemplateStoreRead,
    S: SchemaRegistryRead,
    P: PartnerDirectoryRead,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TemplateCompiler instance")
    }
}

impl<T, S, P> TemplateCompiler<T, S, P>
where
    T: TemplateStoreRead,
    S: SchemaRegistryRead,
    P: PartnerDirectoryRead,
{
    pub fn new(config: TemplateCompilerConfig<T, S, P>) -> Self {
        Self {
            template_store: config.template_store,
            schema_registry: config.schema_registry,
            partner_directory: config.partner_directory,
            clock: config.clock,
        }
    }

    /// Compiles `template_id` for `partner_id` into a request in `format`.
    ///
    /// Missing template or partner, a partner without a connection, and
    /// template validation failures abort the whole call. Groups whose
    /// schema cannot be resolved for `format` are dropped and reported in
    /// the outcome's gap list; the call still succeeds.
    pub async fn compile(
        &self,
        template_id: &TemplateId,
        partner_id: &PartnerId,
        format: ProofRequestFormat,
    ) -> CompilerResult<CompilationOutcome> {
        trace!(
            "compile >>> template_id: {template_id}, partner_id: {partner_id}, format: {}",
            format.as_ref()
        );

        let template = self
            .template_store
            .get_template(template_id)
            .await?
            .ok_or_else(|| CompilerError::TemplateNotFound(template_id.clone()))?;

        let partner = self
            .partner_directory
            .get_partner(partner_id)
            .await?
            .ok_or_else(|| CompilerError::PartnerNotFound(partner_id.clone()))?;
        let connection_id = partner
            .connection_id
            .ok_or_else(|| CompilerError::MissingConnection(partner_id.clone()))?;

        template.validate()?;

        let mut gaps = Vec::new();
        let request = match format {
            ProofRequestFormat::Indy => {
                let proof_request = self.compile_indy(&template, &mut gaps).await?;
                CompiledProofRequest::Indy {
                    connection_id,
                    proof_request,
                }
            }
            ProofRequestFormat::Dif => {
                let presentation_definition = self.compile_dif(&template, &mut gaps).await?;
                CompiledProofRequest::Dif {
                    connection_id,
                    presentation_definition,
                }
            }
        };

        debug!(
            "compile <<< template {} compiled with {} gap(s)",
            template_id,
            gaps.len()
        );
        Ok(CompilationOutcome { request, gaps })
    }

    async fn compile_indy(
        &self,
        template: &ProofTemplate,
        gaps: &mut Vec<SchemaResolutionGap>,
    ) -> CompilerResult<ProofRequestPayload> {
        let mut requested_attributes = BTreeMap::new();
        let mut requested_predicates = BTreeMap::new();
        let mut occurrences: BTreeMap<LedgerSchemaId, usize> = BTreeMap::new();

        for group in &template.attribute_groups {
            let Some(schema) = self
                .resolve_group_schema(group, CredentialFormat::Indy, gaps)
                .await
            else {
                continue;
            };

            let occurrence = occurrences
                .entry(schema.ledger_schema_id.clone())
                .and_modify(|n| *n += 1)
                .or_insert(1);
            let referent = referent_key(&schema.ledger_schema_id, *occurrence);

            let applicator = NonRevocationApplicator::new(group.non_revoked, self.clock.as_ref());
            let output = indy::compile_group(group, &schema.ledger_schema_id, &applicator)?;

            if let Some(entry) = output.attribute_entry {
                requested_attributes.insert(referent.clone(), entry);
            }
            for (attribute_name, predicate) in output.predicate_entries {
                requested_predicates.insert(format!("{referent}_{attribute_name}"), predicate);
            }
        }

        Ok(ProofRequestPayload {
            name: template.name.clone(),
            version: PROOF_REQUEST_VERSION.to_owned(),
            requested_attributes,
            requested_predicates,
        })
    }

    async fn compile_dif(
        &self,
        template: &ProofTemplate,
        gaps: &mut Vec<SchemaResolutionGap>,
    ) -> CompilerResult<PresentationDefinition> {
        let definition_id = Uuid::new_v5(&PRESENTATION_NAMESPACE, template.id.0.as_bytes());
        let mut occurrences: BTreeMap<String, usize> = BTreeMap::new();
        let mut input_descriptors = Vec::new();

        for group in &template.attribute_groups {
            let Some(schema) = self
                .resolve_group_schema(group, CredentialFormat::JsonLd, gaps)
                .await
            else {
                continue;
            };
            let Some(expanded_type) = schema.expanded_type else {
                push_gap(
                    gaps,
                    &group.schema_ref,
                    "schema has no expanded credential type".to_owned(),
                );
                continue;
            };

            let occurrence = *occurrences
                .entry(expanded_type.clone())
                .and_modify(|n| *n += 1)
                .or_insert(1);
            let descriptor =
                dif::build_input_descriptor(group, &expanded_type, &definition_id, occurrence)?;
            input_descriptors.push(descriptor);
        }

        Ok(PresentationDefinition::builder()
            .id(definition_id.to_string())
            .name(Some(template.name.clone()))
            .format(Some(ClaimFormat {
                ldp_vp: Some(ProofTypeSpec {
                    proof_type: LDP_PROOF_TYPES.map(str::to_owned).to_vec(),
                }),
            }))
            .input_descriptors(input_descriptors)
            .build())
    }

    /// Resolution failures never fail the call. The group is skipped and the
    /// cause lands in the gap list, whether the reference was unknown, the
    /// registry failed, or the schema's credentials cannot satisfy the
    /// requested protocol.
    async fn resolve_group_schema(
        &self,
        group: &AttributeGroup,
        required: CredentialFormat,
        gaps: &mut Vec<SchemaResolutionGap>,
    ) -> Option<ResolvedSchema> {
        let resolved = match self.schema_registry.resolve_schema(&group.schema_ref).await {
            Ok(resolved) => resolved,
            Err(err) => {
                push_gap(gaps, &group.schema_ref, err.to_string());
                return None;
            }
        };
        let Some(schema) = resolved else {
            push_gap(
                gaps,
                &group.schema_ref,
                "schema reference cannot be resolved".to_owned(),
            );
            return None;
        };
        if schema.format != required {
            push_gap(
                gaps,
                &group.schema_ref,
                format!(
                    "schema resolves to {} credentials, expected {}",
                    schema.format.as_ref(),
                    required.as_ref()
                ),
            );
            return None;
        }
        Some(schema)
    }
}

fn push_gap(gaps: &mut Vec<SchemaResolutionGap>, schema_ref: &SchemaRef, reason: String) {
    warn!("compile >>> dropping group for schema {schema_ref}: {reason}");
    gaps.push(SchemaResolutionGap {
        schema_ref: schema_ref.clone(),
        reason,
    });
}

/// Attribute entries are keyed by ledger schema id; later groups resolving
/// to the same schema get an occurrence suffix instead of overwriting
/// earlier entries.
fn referent_key(ledger_schema_id: &LedgerSchemaId, occurrence: usize) -> String {
    if occurrence <= 1 {
        ledger_schema_id.to_string()
    } else {
        format!("{ledger_schema_id}_{occurrence}")
    }
}
