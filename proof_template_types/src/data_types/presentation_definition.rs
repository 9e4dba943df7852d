use serde_json::Number;
use typed_builder::TypedBuilder;

/// Request body of the claims-based presentation protocol: a presentation
/// definition with one input descriptor per compiled attribute group.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct PresentationDefinition {
    pub id: String,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ClaimFormat>,
    pub input_descriptors: Vec<InputDescriptor>,
}

/// Proof suites the holder may present with.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClaimFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldp_vp: Option<ProofTypeSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProofTypeSpec {
    pub proof_type: Vec<String>,
}

/// Selects credentials of one expanded type and constrains their claims.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct InputDescriptor {
    pub id: String,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub schema: Vec<SchemaUri>,
    pub constraints: Constraints,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaUri {
    pub uri: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ConstraintField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub is_holder: Vec<HolderConstraint>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct ConstraintField {
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub path: Vec<String>,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<ConstraintFilter>,
}

/// JSON-Schema subset applied to the claim value at `path`. Keys follow
/// JSON-Schema casing on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintFilter {
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
}

/// Binds constraint fields to the credential subject, so the holder must be
/// the one the constrained claims are about.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct HolderConstraint {
    pub field_id: Vec<String>,
    pub directive: HolderDirective,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HolderDirective {
    Required,
    Preferred,
}
