pub mod connection_id;
pub mod ledger_schema_id;
pub mod partner_id;
pub mod schema_ref;
pub mod template_id;

pub use connection_id::ConnectionId;
pub use ledger_schema_id::LedgerSchemaId;
pub use partner_id::PartnerId;
pub use schema_ref::SchemaRef;
pub use template_id::TemplateId;
