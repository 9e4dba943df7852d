use crate::impl_proof_object_identifier;

// Local handle under which the schema registry knows a schema. Resolution to
// the ledger identifier happens at compilation time.
impl_proof_object_identifier!(SchemaRef);
