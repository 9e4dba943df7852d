use std::collections::HashSet;

use chrono::{DateTime, Utc};
use typed_builder::TypedBuilder;

use super::{
    identifiers::{SchemaRef, TemplateId},
    operator::ValueOperator,
    restriction::SchemaRestriction,
};
use crate::{error::ValidationError, utils::validation::Validatable};

/// Reusable description of a proof request, authored once by an operator and
/// compiled per counterparty connection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct ProofTemplate {
    pub id: TemplateId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[builder(default)]
    #[serde(default)]
    pub attribute_groups: Vec<AttributeGroup>,
}

/// Attributes requested together from one credential schema.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct AttributeGroup {
    pub schema_ref: SchemaRef,
    pub attributes: Vec<Attribute>,
    #[builder(default)]
    #[serde(default)]
    pub non_revoked: bool,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restrictions: Vec<SchemaRestriction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct Attribute {
    pub name: String,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct Condition {
    pub operator: ValueOperator,
    pub value: String,
}

impl Validatable for ProofTemplate {
    fn validate(&self) -> Result<(), ValidationError> {
        self.id.validate()?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyTemplateName);
        }
        for group in &self.attribute_groups {
            group.validate()?;
        }
        Ok(())
    }
}

impl Validatable for AttributeGroup {
    fn validate(&self) -> Result<(), ValidationError> {
        self.schema_ref.validate()?;
        let mut seen = HashSet::new();
        for attribute in &self.attributes {
            if attribute.name.trim().is_empty() {
                return Err(ValidationError::EmptyAttributeName {
                    schema_ref: self.schema_ref.to_string(),
                });
            }
            if !seen.insert(attribute.name.as_str()) {
                return Err(ValidationError::DuplicateAttribute {
                    schema_ref: self.schema_ref.to_string(),
                    name: attribute.name.clone(),
                });
            }
            if let Some(ref condition) = attribute.condition {
                condition.operator.check_value(&condition.value)?;
            }
        }
        Ok(())
    }
}
