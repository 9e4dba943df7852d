use proof_template_types::{
    data_types::identifiers::{PartnerId, TemplateId},
    error::ValidationError,
};
use thiserror::Error as ThisError;

pub type CompilerResult<T> = Result<T, CompilerError>;

#[derive(Debug, ThisError)]
pub enum CompilerError {
    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateId),
    #[error("Partner not found: {0}")]
    PartnerNotFound(PartnerId),
    #[error("Partner {0} has no active connection")]
    MissingConnection(PartnerId),
    #[error("Unsupported proof request format: {0}")]
    UnsupportedFormat(String),
    #[error("Template validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Store error: {0}")]
    Store(String),
}
