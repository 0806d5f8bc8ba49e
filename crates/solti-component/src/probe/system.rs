use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::trace;

use crate::probe::{HostProbe, HostSample, ProbeError};

/// Upper bound for a single sample.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Samples resident memory and CPU usage of one process through `sysinfo`.
///
/// The `System` is kept between samples: CPU usage is a delta against the previous
/// refresh, so the very first sample reports 0%.
#[derive(Clone)]
pub struct SysinfoProbe {
    pid: Pid,
    timeout: Duration,
    system: Arc<Mutex<System>>,
}

impl SysinfoProbe {
    pub fn new(pid: u32) -> Self {
        Self {
            pid: Pid::from_u32(pid),
            timeout: PROBE_TIMEOUT,
            system: Arc::new(Mutex::new(System::new())),
        }
    }

    /// Probe for the calling process.
    pub fn current() -> Self {
        Self::new(std::process::id())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn pid(&self) -> u32 {
        self.pid.as_u32()
    }
}

#[async_trait]
impl HostProbe for SysinfoProbe {
    async fn sample(&self) -> Result<HostSample, ProbeError> {
        let pid = self.pid;
        let system = Arc::clone(&self.system);

        trace!(target: "solti.component.probe", pid = pid.as_u32(), "refresh process");
        let task = tokio::task::spawn_blocking(move || sample_blocking(&system, pid));
        tokio::time::timeout(self.timeout, task)
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
            .map_err(|e| ProbeError::Task(e.to_string()))?
    }
}

fn sample_blocking(system: &Mutex<System>, pid: Pid) -> Result<HostSample, ProbeError> {
    let mut system = system
        .lock()
        .map_err(|_| ProbeError::Task("probe state poisoned".into()))?;
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory().with_cpu(),
    );

    let process = system
        .process(pid)
        .ok_or(ProbeError::ProcessNotFound(pid.as_u32()))?;
    Ok(HostSample {
        mem_kb: process.memory() / 1024,
        cpu_percent: f64::from(process.cpu_usage()),
    })
}
