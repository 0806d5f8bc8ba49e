use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Credentials, Identity, Uptime};

/// Self-description a component publishes on announce and sends back to discover requests.
///
/// The flat key set (`type`, `uuid`, `host`, `credentials`, `start`, `uptime`)
/// is the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub uuid: String,
    /// `ip:port` of the HTTP endpoint.
    pub host: String,
    pub credentials: Credentials,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    /// Refreshed right before every publish.
    #[serde(default)]
    pub uptime: Uptime,
}

impl DiscoveryDocument {
    pub fn new(identity: &Identity, credentials: &Credentials) -> Self {
        Self {
            kind: identity.kind.clone(),
            uuid: identity.uuid.clone(),
            host: identity.address(),
            credentials: credentials.clone(),
            start: identity.start,
            uptime: Uptime::default(),
        }
    }
}
