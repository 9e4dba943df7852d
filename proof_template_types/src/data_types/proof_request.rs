use std::collections::BTreeMap;

use super::operator::PredicateType;

pub type PredicateValue = i32;

/// Revocation freshness window attached to a requested entry. The engine
/// always emits point intervals, with `from` and `to` set to the same
/// timestamp taken when compilation started on the group.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct NonRevokedInterval {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl NonRevokedInterval {
    #[must_use]
    pub const fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub const fn at(timestamp: u64) -> Self {
        Self {
            from: Some(timestamp),
            to: Some(timestamp),
        }
    }
}

/// One acceptable credential source for a requested entry. Multiple filters
/// on the same entry are alternatives.
///
/// Equality conditions surface here as flattened `attr::<name>::value` tags
/// next to the fixed provenance fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RestrictionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_issuer_did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cred_def_id: Option<String>,
    #[serde(flatten, skip_serializing_if = "BTreeMap::is_empty")]
    pub attr_value_tags: BTreeMap<String, String>,
}

impl RestrictionFilter {
    /// Tag key constraining the raw value of one credential attribute.
    #[must_use]
    pub fn value_tag(attribute_name: &str) -> String {
        format!("attr::{attribute_name}::value")
    }
}

/// Revealed attributes requested from one credential. Entries produced by the
/// engine always carry `names`, listing the group's revealed attributes in
/// template order.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestedAttribute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub restrictions: Vec<RestrictionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// A single zero-knowledge comparison over one credential attribute.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestedPredicate {
    pub name: String,
    pub p_type: PredicateType,
    pub p_value: PredicateValue,
    #[serde(default)]
    pub restrictions: Vec<RestrictionFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// Request body of the attribute/predicate presentation protocol.
///
/// Maps are ordered so that repeated compilations of the same template
/// serialize byte-identically.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProofRequestPayload {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, RequestedAttribute>,
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, RequestedPredicate>,
}
