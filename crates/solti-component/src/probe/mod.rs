//! Host metrics sampling for the current process.
use async_trait::async_trait;

mod error;
pub use error::ProbeError;

mod system;
pub use system::{PROBE_TIMEOUT, SysinfoProbe};

/// Point-in-time resource usage of a process.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostSample {
    /// Resident set size in KB.
    pub mem_kb: u64,
    /// CPU usage in percent.
    pub cpu_percent: f64,
}

/// Source of [`HostSample`]s.
///
/// Callers reach for it at most once per refresh window.
#[async_trait]
pub trait HostProbe: Send + Sync + 'static {
    async fn sample(&self) -> Result<HostSample, ProbeError>;
}
