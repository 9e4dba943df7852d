use std::collections::BTreeSet;

use strum_macros::AsRefStr;
use typed_builder::TypedBuilder;

use super::identifiers::LedgerSchemaId;

/// Credential format a schema's issued credentials are anchored in. Each
/// presentation protocol can only consume one of them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, AsRefStr, Deserialize, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CredentialFormat {
    Indy,
    JsonLd,
}

/// Registry view of a schema at compilation time. Derived on demand, never
/// persisted by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct ResolvedSchema {
    pub ledger_schema_id: LedgerSchemaId,
    pub attribute_names: BTreeSet<String>,
    pub format: CredentialFormat,
    /// Expanded JSON-LD type of the credential, present for
    /// [`CredentialFormat::JsonLd`] schemas only.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded_type: Option<String>,
}
