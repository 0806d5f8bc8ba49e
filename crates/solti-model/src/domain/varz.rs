use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ConfigMap, Credentials, DiscoveryDocument, Uptime};

/// Detailed operational snapshot served on `/varz`.
///
/// Seeded from the discovery document; `uptime`, `mem` and `cpu` change on refresh.
/// Components may attach their own fields through `custom`, which is flattened into the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Varz {
    #[serde(rename = "type")]
    pub kind: String,
    pub uuid: String,
    pub host: String,
    pub credentials: Credentials,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(default)]
    pub uptime: Uptime,
    pub num_cores: usize,
    /// Sanitized component configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigMap>,
    /// Resident memory in KB.
    #[serde(default)]
    pub mem: u64,
    /// CPU usage in percent.
    #[serde(default)]
    pub cpu: f64,
    #[serde(flatten)]
    pub custom: ConfigMap,
}

impl Varz {
    /// Top-level keys owned by the snapshot itself.
    pub const RESERVED_FIELDS: &'static [&'static str] = &[
        "type",
        "uuid",
        "host",
        "credentials",
        "start",
        "uptime",
        "num_cores",
        "config",
        "mem",
        "cpu",
    ];

    pub fn seeded(document: &DiscoveryDocument, num_cores: usize) -> Self {
        Self {
            kind: document.kind.clone(),
            uuid: document.uuid.clone(),
            host: document.host.clone(),
            credentials: document.credentials.clone(),
            start: document.start,
            uptime: document.uptime,
            num_cores,
            config: None,
            mem: 0,
            cpu: 0.0,
            custom: ConfigMap::new(),
        }
    }

    pub fn is_reserved(key: &str) -> bool {
        Self::RESERVED_FIELDS.contains(&key)
    }
}
