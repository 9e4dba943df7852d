use thiserror::Error;

/// Failures of [`crate::utils::validation::Validatable::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} must not be empty")]
    EmptyIdentifier { kind: &'static str },
    #[error("template name must not be empty")]
    EmptyTemplateName,
    #[error("attribute group for schema {schema_ref} contains an attribute with an empty name")]
    EmptyAttributeName { schema_ref: String },
    #[error("attribute {name} is requested more than once for schema {schema_ref}")]
    DuplicateAttribute { schema_ref: String, name: String },
    #[error("value {value} is not valid for operator {operator}: {reason}")]
    InvalidConditionValue {
        operator: String,
        value: String,
        reason: String,
    },
}
