use async_trait::async_trait;
use proof_template_types::data_types::{
    identifiers::{PartnerId, SchemaRef, TemplateId},
    partner::Partner,
    schema::ResolvedSchema,
    template::ProofTemplate,
};

use crate::errors::error::CompilerResult;

/// Read access to authored proof templates.
#[async_trait]
pub trait TemplateStoreRead: Send + Sync {
    async fn get_template(&self, id: &TemplateId) -> CompilerResult<Option<ProofTemplate>>;
}

/// Resolves local schema references to their registry view. `Ok(None)` means
/// the reference is unknown; transport failures are reported as errors and
/// treated by the engine the same way, scoped to the affected group.
#[async_trait]
pub trait SchemaRegistryRead: Send + Sync {
    async fn resolve_schema(
        &self,
        schema_ref: &SchemaRef,
    ) -> CompilerResult<Option<ResolvedSchema>>;
}

/// Read access to the partner directory.
#[async_trait]
pub trait PartnerDirectoryRead: Send + Sync {
    async fn get_partner(&self, id: &PartnerId) -> CompilerResult<Option<Partner>>;
}
