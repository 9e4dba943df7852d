pub mod macros;

pub mod identifiers;
pub mod operator;
pub mod partner;
pub mod presentation_definition;
pub mod proof_request;
pub mod restriction;
pub mod schema;
pub mod template;
