mod identity;
pub use identity::Identity;

mod credentials;
pub use credentials::Credentials;

mod uptime;
pub use uptime::Uptime;

mod discovery;
pub use discovery::DiscoveryDocument;

mod varz;
pub use varz::Varz;

/// Flat configuration mapping embedded into varz.
///
/// Keys are always strings; values keep whatever structure the component supplied.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;
