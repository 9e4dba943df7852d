use typed_builder::TypedBuilder;

use super::identifiers::{ConnectionId, PartnerId};

/// Directory record of a counterparty. A partner without a connection exists
/// in the directory but cannot be sent proof requests.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct Partner {
    pub id: PartnerId,
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
}
