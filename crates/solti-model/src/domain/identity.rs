use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identity of a registered component.
///
/// Built once during registration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Component kind (e.g. `"router"`, `"dea"`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque instance identifier, unique per registration.
    pub uuid: String,
    /// Address the component is reachable on.
    pub host: String,
    /// Port of the component's HTTP endpoint.
    pub port: u16,
    /// Wall-clock time the component registered at.
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
}

impl Identity {
    /// Returns the `host:port` pair advertised on the bus.
    ///
    /// IPv6 hosts are bracketed, hostnames are passed through untouched.
    pub fn address(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}
