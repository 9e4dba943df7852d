use crate::impl_proof_object_identifier;

impl_proof_object_identifier!(ConnectionId);
