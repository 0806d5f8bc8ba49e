#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use solti_component::{
    Component, ComponentOptions, ComponentRegistry, HostProbe, HostSample, LocalBus, ManualClock,
    ProbeError,
};

pub const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

/// Probe stub counting its invocations.
#[derive(Default)]
pub struct CountingProbe {
    calls: AtomicUsize,
}

impl CountingProbe {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostProbe for CountingProbe {
    async fn sample(&self) -> Result<HostSample, ProbeError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(HostSample {
            mem_kb: 4096 + n as u64,
            cpu_percent: 1.5,
        })
    }
}

pub struct Harness {
    pub bus: LocalBus,
    pub clock: ManualClock,
    pub probe: Arc<CountingProbe>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            bus: LocalBus::new(),
            clock: ManualClock::new(),
            probe: Arc::new(CountingProbe::default()),
        }
    }

    pub fn options(&self, kind: &str) -> ComponentOptions {
        ComponentOptions::new(kind)
            .with_host("127.0.0.1")
            .with_bus(Arc::new(self.bus.clone()))
            .with_probe(self.probe.clone())
            .with_clock(Arc::new(self.clock.clone()))
    }

    pub async fn register(&self, options: ComponentOptions) -> Component {
        ComponentRegistry::new()
            .register(options)
            .await
            .expect("registration should succeed")
    }
}

pub async fn http_get(
    component: &Component,
    path: &str,
    user: &str,
    pass: &str,
) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("http://{}{}", component.http_addr(), path))
        .basic_auth(user, Some(pass))
        .send()
        .await
        .expect("http request should complete")
}

pub async fn authed_get(component: &Component, path: &str) -> reqwest::Response {
    let creds = component.credentials().clone();
    http_get(component, path, creds.username(), creds.password()).await
}
