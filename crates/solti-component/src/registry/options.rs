use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use solti_model::ConfigMap;

use crate::{
    bus::Bus, clock::Clock, error::ComponentError, probe::HostProbe, stats::HealthzProvider,
};

/// Registration options.
///
/// Only the component kind is required; everything else has a sensible default.
pub struct ComponentOptions {
    pub(crate) kind: String,
    pub(crate) host: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) bus: Option<Arc<dyn Bus>>,
    pub(crate) config: Option<ConfigMap>,
    pub(crate) denied_keys: Vec<String>,
    pub(crate) healthz: Option<HealthzProvider>,
    pub(crate) probe: Option<Arc<dyn HostProbe>>,
    pub(crate) clock: Option<Arc<dyn Clock>>,
}

impl ComponentOptions {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            host: None,
            port: None,
            bus: None,
            config: None,
            denied_keys: Vec::new(),
            healthz: None,
            probe: None,
            clock: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Address to bind and advertise; defaults to the outbound interface.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// HTTP port; defaults to an ephemeral port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Bus to use instead of the process-wide default.
    pub fn with_bus(mut self, bus: Arc<dyn Bus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Configuration to sanitize and embed in varz.
    ///
    /// Any serializable value works as long as it serializes to a map.
    pub fn with_config<T: Serialize>(mut self, config: &T) -> Result<Self, ComponentError> {
        match serde_json::to_value(config)? {
            Value::Object(map) => {
                self.config = Some(map);
                Ok(self)
            }
            other => Err(ComponentError::InvalidConfig(format!(
                "expected a map, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn with_config_map(mut self, config: ConfigMap) -> Self {
        self.config = Some(config);
        self
    }

    /// Extra key to keep out of varz, on top of the default deny-list.
    pub fn deny_config_key(mut self, key: impl Into<String>) -> Self {
        self.denied_keys.push(key.into());
        self
    }

    /// Compute healthz dynamically (at most once per refresh interval).
    pub fn with_healthz<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.healthz = Some(Arc::new(provider));
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn HostProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
