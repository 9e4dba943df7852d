use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use proof_template_compiler::{
    compiler::{
        revocation::RevocationClock, CompiledProofRequest, ProofRequestFormat, TemplateCompiler,
        TemplateCompilerConfig,
    },
    errors::error::{CompilerError, CompilerResult},
    resolver::base_resolver::{PartnerDirectoryRead, SchemaRegistryRead, TemplateStoreRead},
};
use proof_template_types::{
    data_types::{
        identifiers::{ConnectionId, LedgerSchemaId, PartnerId, SchemaRef, TemplateId},
        operator::ValueOperator,
        partner::Partner,
        restriction::SchemaRestriction,
        schema::{CredentialFormat, ResolvedSchema},
        template::{Attribute, AttributeGroup, Condition, ProofTemplate},
    },
    error::ValidationError,
};
use serde_json::json;

mock! {
    pub TemplateStore {}
    #[async_trait]
    impl TemplateStoreRead for TemplateStore {
        async fn get_template(&self, id: &TemplateId) -> CompilerResult<Option<ProofTemplate>>;
    }
}

mock! {
    pub SchemaRegistry {}
    #[async_trait]
    impl SchemaRegistryRead for SchemaRegistry {
        async fn resolve_schema(
            &self,
            schema_ref: &SchemaRef,
        ) -> CompilerResult<Option<ResolvedSchema>>;
    }
}

mock! {
    pub PartnerDirectory {}
    #[async_trait]
    impl PartnerDirectoryRead for PartnerDirectory {
        async fn get_partner(&self, id: &PartnerId) -> CompilerResult<Option<Partner>>;
    }
}

#[derive(Debug)]
struct FixedClock(u64);

impl RevocationClock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// Advances by one second on every read.
#[derive(Debug, Default)]
struct SteppingClock(AtomicU64);

impl RevocationClock for SteppingClock {
    fn now(&self) -> u64 {
        1_714_000_000 + self.0.fetch_add(1, Ordering::SeqCst)
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const IDENTITY_SCHEMA_ID: &str = "townhall:2:identity-card:1.0";
const EMPLOYMENT_SCHEMA_ID: &str = "acme:2:employment:4.2";

fn identity_schema() -> ResolvedSchema {
    ResolvedSchema::builder()
        .ledger_schema_id(LedgerSchemaId::new_unchecked(IDENTITY_SCHEMA_ID))
        .attribute_names(BTreeSet::from([
            "given_name".to_owned(),
            "citizenship".to_owned(),
            "birth_year".to_owned(),
        ]))
        .format(CredentialFormat::Indy)
        .build()
}

fn employment_schema() -> ResolvedSchema {
    ResolvedSchema::builder()
        .ledger_schema_id(LedgerSchemaId::new_unchecked(EMPLOYMENT_SCHEMA_ID))
        .attribute_names(BTreeSet::from(["employer".to_owned()]))
        .format(CredentialFormat::Indy)
        .build()
}

fn created_at() -> DateTime<Utc> {
    "2024-05-01T12:00:00Z".parse().unwrap()
}

fn identity_group() -> AttributeGroup {
    AttributeGroup::builder()
        .schema_ref(SchemaRef::new_unchecked("identity-card"))
        .attributes(vec![
            Attribute::builder().name("given_name".to_owned()).build(),
            Attribute::builder()
                .name("citizenship".to_owned())
                .condition(Some(
                    Condition::builder()
                        .operator(ValueOperator::Equals)
                        .value("Utopia".to_owned())
                        .build(),
                ))
                .build(),
            Attribute::builder()
                .name("birth_year".to_owned())
                .condition(Some(
                    Condition::builder()
                        .operator(ValueOperator::LessThanOrEqual)
                        .value("2006".to_owned())
                        .build(),
                ))
                .build(),
        ])
        .non_revoked(true)
        .restrictions(vec![SchemaRestriction {
            issuer_did: Some("did:sov:townhall".to_owned()),
            ..Default::default()
        }])
        .build()
}

fn employment_group() -> AttributeGroup {
    AttributeGroup::builder()
        .schema_ref(SchemaRef::new_unchecked("employment"))
        .attributes(vec![Attribute::builder()
            .name("employer".to_owned())
            .build()])
        .build()
}

fn screening_template() -> ProofTemplate {
    ProofTemplate::builder()
        .id(TemplateId::new_unchecked("tmpl-screening"))
        .name("Employment screening".to_owned())
        .created_at(created_at())
        .attribute_groups(vec![identity_group(), employment_group()])
        .build()
}

fn template_store(template: ProofTemplate) -> MockTemplateStore {
    let mut store = MockTemplateStore::new();
    store.expect_get_template().returning(move |_| Ok(Some(template.clone())));
    store
}

fn registry_with_both_schemas() -> MockSchemaRegistry {
    let mut registry = MockSchemaRegistry::new();
    registry.expect_resolve_schema().returning(|schema_ref| match schema_ref.0.as_str() {
        "identity-card" => Ok(Some(identity_schema())),
        "employment" => Ok(Some(employment_schema())),
        _ => Ok(None),
    });
    registry
}

fn connected_partner_directory() -> MockPartnerDirectory {
    let mut directory = MockPartnerDirectory::new();
    directory.expect_get_partner().returning(|id| {
        Ok(Some(
            Partner::builder()
                .id(id.clone())
                .connection_id(Some(ConnectionId::new_unchecked("conn-42")))
                .build(),
        ))
    });
    directory
}

fn compiler_with(
    store: MockTemplateStore,
    registry: MockSchemaRegistry,
    directory: MockPartnerDirectory,
    clock: impl RevocationClock + 'static,
) -> TemplateCompiler<MockTemplateStore, MockSchemaRegistry, MockPartnerDirectory> {
    TemplateCompiler::new(TemplateCompilerConfig {
        template_store: store,
        schema_registry: registry,
        partner_directory: directory,
        clock: Box::new(clock),
    })
}

#[tokio::test]
async fn compiles_mixed_template_into_attribute_and_predicate_maps() {
    init_logger();
    let compiler = compiler_with(
        template_store(screening_template()),
        registry_with_both_schemas(),
        connected_partner_directory(),
        FixedClock(1_714_000_000),
    );

    let outcome = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-screening"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap();

    assert!(outcome.gaps.is_empty());
    assert_eq!(
        serde_json::to_value(&outcome.request).unwrap(),
        json!({
            "format": "indy",
            "connection_id": "conn-42",
            "proof_request": {
                "name": "Employment screening",
                "version": "1.0",
                "requested_attributes": {
                    IDENTITY_SCHEMA_ID: {
                        "names": ["given_name", "citizenship"],
                        "restrictions": [{
                            "schema_id": IDENTITY_SCHEMA_ID,
                            "issuer_did": "did:sov:townhall",
                            "attr::citizenship::value": "Utopia",
                        }],
                        "non_revoked": { "from": 1_714_000_000u64, "to": 1_714_000_000u64 },
                    },
                    EMPLOYMENT_SCHEMA_ID: {
                        "names": ["employer"],
                        "restrictions": [{ "schema_id": EMPLOYMENT_SCHEMA_ID }],
                    },
                },
                "requested_predicates": {
                    "townhall:2:identity-card:1.0_birth_year": {
                        "name": "birth_year",
                        "p_type": "<=",
                        "p_value": 2006,
                        "restrictions": [{
                            "schema_id": IDENTITY_SCHEMA_ID,
                            "issuer_did": "did:sov:townhall",
                            "attr::citizenship::value": "Utopia",
                        }],
                        "non_revoked": { "from": 1_714_000_000u64, "to": 1_714_000_000u64 },
                    },
                },
            },
        })
    );
}

#[tokio::test]
async fn recompilation_is_byte_identical() {
    init_logger();
    let first = compiler_with(
        template_store(screening_template()),
        registry_with_both_schemas(),
        connected_partner_directory(),
        FixedClock(1_714_000_000),
    );
    let second = compiler_with(
        template_store(screening_template()),
        registry_with_both_schemas(),
        connected_partner_directory(),
        FixedClock(1_714_000_000),
    );

    let template_id = TemplateId::new_unchecked("tmpl-screening");
    let partner_id = PartnerId::new_unchecked("partner-7");
    let outcome_one = first
        .compile(&template_id, &partner_id, ProofRequestFormat::Indy)
        .await
        .unwrap();
    let outcome_two = second
        .compile(&template_id, &partner_id, ProofRequestFormat::Indy)
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&outcome_one.request).unwrap(),
        serde_json::to_string(&outcome_two.request).unwrap()
    );
}

#[tokio::test]
async fn missing_template_fails_with_not_found() {
    let mut store = MockTemplateStore::new();
    store.expect_get_template().returning(|_| Ok(None));

    let compiler = compiler_with(
        store,
        MockSchemaRegistry::new(),
        MockPartnerDirectory::new(),
        FixedClock(0),
    );

    let err = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-unknown"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CompilerError::TemplateNotFound(id) if id.0 == "tmpl-unknown"));
}

#[tokio::test]
async fn unknown_partner_fails_with_not_found() {
    let mut directory = MockPartnerDirectory::new();
    directory.expect_get_partner().returning(|_| Ok(None));

    let compiler = compiler_with(
        template_store(screening_template()),
        MockSchemaRegistry::new(),
        directory,
        FixedClock(0),
    );

    let err = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-screening"),
            &PartnerId::new_unchecked("partner-unknown"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CompilerError::PartnerNotFound(id) if id.0 == "partner-unknown"));
}

#[tokio::test]
async fn partner_without_connection_is_a_precondition_failure() {
    let mut directory = MockPartnerDirectory::new();
    directory
        .expect_get_partner()
        .returning(|id| Ok(Some(Partner::builder().id(id.clone()).build())));

    // No registry expectation: resolution must not be attempted for a
    // partner that cannot receive requests.
    let compiler = compiler_with(
        template_store(screening_template()),
        MockSchemaRegistry::new(),
        directory,
        FixedClock(0),
    );

    let err = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-screening"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CompilerError::MissingConnection(id) if id.0 == "partner-7"));
}

#[tokio::test]
async fn unresolvable_schema_drops_group_and_reports_gap() {
    init_logger();
    let mut registry = MockSchemaRegistry::new();
    registry.expect_resolve_schema().returning(|schema_ref| match schema_ref.0.as_str() {
        "identity-card" => Ok(Some(identity_schema())),
        _ => Ok(None),
    });

    let compiler = compiler_with(
        template_store(screening_template()),
        registry,
        connected_partner_directory(),
        FixedClock(1_714_000_000),
    );

    let outcome = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-screening"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap();

    assert_eq!(outcome.gaps.len(), 1);
    assert_eq!(outcome.gaps[0].schema_ref.0, "employment");
    assert_eq!(outcome.gaps[0].reason, "schema reference cannot be resolved");

    let CompiledProofRequest::Indy { proof_request, .. } = outcome.request else {
        panic!("expected a legacy request");
    };
    assert!(proof_request.requested_attributes.contains_key(IDENTITY_SCHEMA_ID));
    assert!(!proof_request.requested_attributes.contains_key(EMPLOYMENT_SCHEMA_ID));
}

#[tokio::test]
async fn registry_failure_counts_as_gap_not_call_failure() {
    let mut registry = MockSchemaRegistry::new();
    registry.expect_resolve_schema().returning(|schema_ref| match schema_ref.0.as_str() {
        "identity-card" => Ok(Some(identity_schema())),
        _ => Err(CompilerError::Store("registry unreachable".to_owned())),
    });

    let compiler = compiler_with(
        template_store(screening_template()),
        registry,
        connected_partner_directory(),
        FixedClock(1_714_000_000),
    );

    let outcome = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-screening"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap();

    assert_eq!(outcome.gaps.len(), 1);
    assert_eq!(outcome.gaps[0].schema_ref.0, "employment");
    assert_eq!(outcome.gaps[0].reason, "Store error: registry unreachable");
}

#[tokio::test]
async fn json_ld_schema_cannot_satisfy_legacy_requests() {
    let mut registry = MockSchemaRegistry::new();
    registry.expect_resolve_schema().returning(|_| {
        Ok(Some(
            ResolvedSchema::builder()
                .ledger_schema_id(LedgerSchemaId::new_unchecked(IDENTITY_SCHEMA_ID))
                .attribute_names(BTreeSet::new())
                .format(CredentialFormat::JsonLd)
                .expanded_type(Some(
                    "https://townhall.example/credentials#IdentityCard".to_owned(),
                ))
                .build(),
        ))
    });

    let template = ProofTemplate::builder()
        .id(TemplateId::new_unchecked("tmpl-screening"))
        .name("Employment screening".to_owned())
        .created_at(created_at())
        .attribute_groups(vec![identity_group()])
        .build();

    let compiler = compiler_with(
        template_store(template),
        registry,
        connected_partner_directory(),
        FixedClock(0),
    );

    let outcome = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-screening"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap();

    assert_eq!(outcome.gaps.len(), 1);
    assert_eq!(outcome.gaps[0].reason, "schema resolves to json_ld credentials, expected indy");
}

#[tokio::test]
async fn duplicate_schema_groups_get_suffixed_referents() {
    let template = ProofTemplate::builder()
        .id(TemplateId::new_unchecked("tmpl-two-cards"))
        .name("Two identity cards".to_owned())
        .created_at(created_at())
        .attribute_groups(vec![
            AttributeGroup::builder()
                .schema_ref(SchemaRef::new_unchecked("identity-card"))
                .attributes(vec![Attribute::builder()
                    .name("given_name".to_owned())
                    .build()])
                .build(),
            AttributeGroup::builder()
                .schema_ref(SchemaRef::new_unchecked("identity-card"))
                .attributes(vec![
                    Attribute::builder().name("citizenship".to_owned()).build(),
                    Attribute::builder()
                        .name("birth_year".to_owned())
                        .condition(Some(
                            Condition::builder()
                                .operator(ValueOperator::GreaterThanOrEqual)
                                .value("1950".to_owned())
                                .build(),
                        ))
                        .build(),
                ])
                .build(),
        ])
        .build();

    let compiler = compiler_with(
        template_store(template),
        registry_with_both_schemas(),
        connected_partner_directory(),
        FixedClock(0),
    );

    let outcome = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-two-cards"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap();

    let CompiledProofRequest::Indy { proof_request, .. } = outcome.request else {
        panic!("expected a legacy request");
    };
    let attribute_keys: Vec<&String> = proof_request.requested_attributes.keys().collect();
    assert_eq!(attribute_keys, vec![IDENTITY_SCHEMA_ID, "townhall:2:identity-card:1.0_2"]);
    assert!(proof_request
        .requested_predicates
        .contains_key("townhall:2:identity-card:1.0_2_birth_year"));
}

#[tokio::test]
async fn validation_failure_aborts_before_output() {
    let mut template = screening_template();
    template.attribute_groups[0]
        .attributes
        .push(Attribute::builder().name("given_name".to_owned()).build());

    // No registry expectation: validation failures abort before resolution.
    let compiler = compiler_with(
        template_store(template),
        MockSchemaRegistry::new(),
        connected_partner_directory(),
        FixedClock(0),
    );

    let err = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-screening"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CompilerError::Validation(ValidationError::DuplicateAttribute { name, .. })
            if name == "given_name"
    ));
}

#[tokio::test]
async fn groups_freeze_separate_timestamps_as_the_clock_advances() {
    let template = ProofTemplate::builder()
        .id(TemplateId::new_unchecked("tmpl-revocable"))
        .name("Revocable pair".to_owned())
        .created_at(created_at())
        .attribute_groups(vec![
            AttributeGroup::builder()
                .schema_ref(SchemaRef::new_unchecked("identity-card"))
                .attributes(vec![
                    Attribute::builder().name("given_name".to_owned()).build(),
                    Attribute::builder()
                        .name("birth_year".to_owned())
                        .condition(Some(
                            Condition::builder()
                                .operator(ValueOperator::LessThan)
                                .value("2010".to_owned())
                                .build(),
                        ))
                        .build(),
                ])
                .non_revoked(true)
                .build(),
            AttributeGroup::builder()
                .schema_ref(SchemaRef::new_unchecked("employment"))
                .attributes(vec![Attribute::builder()
                    .name("employer".to_owned())
                    .build()])
                .non_revoked(true)
                .build(),
        ])
        .build();

    let compiler = compiler_with(
        template_store(template),
        registry_with_both_schemas(),
        connected_partner_directory(),
        SteppingClock::default(),
    );

    let outcome = compiler
        .compile(
            &TemplateId::new_unchecked("tmpl-revocable"),
            &PartnerId::new_unchecked("partner-7"),
            ProofRequestFormat::Indy,
        )
        .await
        .unwrap();

    let CompiledProofRequest::Indy { proof_request, .. } = outcome.request else {
        panic!("expected a legacy request");
    };

    let identity_interval = proof_request.requested_attributes[IDENTITY_SCHEMA_ID]
        .non_revoked
        .unwrap();
    let identity_predicate_interval = proof_request.requested_predicates
        ["townhall:2:identity-card:1.0_birth_year"]
        .non_revoked
        .unwrap();
    let employment_interval = proof_request.requested_attributes[EMPLOYMENT_SCHEMA_ID]
        .non_revoked
        .unwrap();

    // One timestamp per group, shared by every entry of that group.
    assert_eq!(identity_interval, identity_predicate_interval);
    assert_ne!(identity_interval, employment_interval);
    assert_eq!(identity_interval.from, identity_interval.to);
    assert_eq!(employment_interval.from, employment_interval.to);
}
