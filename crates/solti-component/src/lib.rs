//! Self-reporting component agent.
//!
//! Any networked service can embed this crate to:
//! - announce itself on the bus (`component.announce`) and answer `component.discover` requests
//! - expose basic-auth protected `/healthz` and `/varz` endpoints
//! - keep a throttled snapshot of process metrics and sanitized configuration
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use solti_component::{ComponentOptions, ComponentRegistry, LocalBus};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let bus = LocalBus::new();
//! let component = ComponentRegistry::new()
//!     .register(
//!         ComponentOptions::new("router")
//!             .with_bus(Arc::new(bus))
//!             .with_config(&serde_json::json!({"mbus": "nats://localhost", "port": 80}))?,
//!     )
//!     .await?;
//!
//! println!("varz on http://{}/varz", component.http_addr());
//! component.shutdown().await;
//! # Ok(())
//! # }
//! ```
mod bus;
pub use bus::{Bus, BusError, BusMessage, LocalBus, Subscription, default_bus, install_default_bus};

mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

mod error;
pub use error::ComponentError;

mod probe;
pub use probe::{HostProbe, HostSample, PROBE_TIMEOUT, ProbeError, SysinfoProbe};

mod sanitize;
pub use sanitize::{ConfigSanitizer, DEFAULT_DENIED_KEYS, normalize_key};

mod stats;
pub use stats::{DEFAULT_HEALTHZ, HealthzProvider, REFRESH_INTERVAL, StatsCache};

mod discover;
pub use discover::{ANNOUNCE_SUBJECT, DISCOVER_SUBJECT, DiscoveryAnnouncer};

mod http;
pub use http::HttpExposer;

mod registry;
pub use registry::{Component, ComponentOptions, ComponentRegistry};

mod system;
pub use system::{local_ip, num_cores, resolve_host};

pub use solti_model::{ConfigMap, Credentials, DiscoveryDocument, Identity, Uptime, Varz};
