//! Lazily refreshed varz/healthz snapshots.
//!
//! Nothing runs on a timer: the first read after the refresh interval has elapsed
//! performs the refresh, every other read in that window is served from the cached snapshot.
//! Reads that arrive while a refresh is in flight wait for it and see the refreshed values.
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde_json::Value;
use solti_model::{ConfigMap, Uptime, Varz};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::{clock::Clock, error::ComponentError, probe::HostProbe};

mod gate;
use gate::RefreshGate;

/// Minimum time between two refreshes of the same snapshot.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Healthz text served until a component overrides it.
pub const DEFAULT_HEALTHZ: &str = "ok\n";

/// Computes the healthz text on refresh.
pub type HealthzProvider = Arc<dyn Fn() -> String + Send + Sync>;

pub struct StatsCache {
    clock: Arc<dyn Clock>,
    probe: Arc<dyn HostProbe>,
    healthz_provider: Option<HealthzProvider>,
    started: Instant,

    varz: RwLock<Varz>,
    healthz: RwLock<String>,
    varz_gate: RefreshGate,
    healthz_gate: RefreshGate,
    // Held for the duration of a refresh; readers pass through it before reading.
    varz_refresh: Mutex<()>,
    healthz_refresh: Mutex<()>,
}

impl StatsCache {
    /// Create a cache around the initial snapshot.
    ///
    /// `started` is the instant uptime is measured from; it should come from the same `clock`.
    pub fn new(
        initial: Varz,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn HostProbe>,
        started: Instant,
    ) -> Self {
        let epoch = clock.now();
        Self {
            clock,
            probe,
            healthz_provider: None,
            started,
            varz: RwLock::new(initial),
            healthz: RwLock::new(DEFAULT_HEALTHZ.to_string()),
            varz_gate: RefreshGate::new(epoch, REFRESH_INTERVAL),
            healthz_gate: RefreshGate::new(epoch, REFRESH_INTERVAL),
            varz_refresh: Mutex::new(()),
            healthz_refresh: Mutex::new(()),
        }
    }

    pub fn with_healthz_provider(mut self, provider: Option<HealthzProvider>) -> Self {
        self.healthz_provider = provider;
        self
    }

    /// Current varz, refreshed first if the interval has elapsed.
    pub async fn get_varz(&self) -> Varz {
        {
            let _refresh = self.varz_refresh.lock().await;
            let now = self.clock.now();
            if self.varz_gate.try_claim(now) {
                self.refresh_varz(now).await;
            }
        }
        self.varz.read().await.clone()
    }

    /// Current healthz text, recomputed first if a provider is set and the interval has elapsed.
    pub async fn get_healthz(&self) -> String {
        if let Some(provider) = &self.healthz_provider {
            let _refresh = self.healthz_refresh.lock().await;
            if self.healthz_gate.try_claim(self.clock.now()) {
                let value = provider();
                *self.healthz.write().await = value;
            }
        }
        self.healthz.read().await.clone()
    }

    /// Overwrite healthz; visible on the next read.
    ///
    /// With a provider configured, the provider is next consulted one refresh interval later.
    pub async fn set_healthz(&self, value: impl Into<String>) {
        let _refresh = self.healthz_refresh.lock().await;
        self.healthz_gate.mark(self.clock.now());
        *self.healthz.write().await = value.into();
    }

    /// Cached varz without triggering a refresh.
    pub async fn peek_varz(&self) -> Varz {
        self.varz.read().await.clone()
    }

    /// Set a component-specific varz field.
    ///
    /// Fields owned by the snapshot itself (see [`Varz::RESERVED_FIELDS`]) are rejected.
    pub async fn set_varz_field(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), ComponentError> {
        let key = key.into();
        if Varz::is_reserved(&key) {
            return Err(ComponentError::ReservedField(key));
        }
        self.varz.write().await.custom.insert(key, value.into());
        Ok(())
    }

    /// Edit component-specific varz fields in place.
    ///
    /// Reserved keys inserted by `f` are dropped.
    pub async fn update_varz<F>(&self, f: F)
    where
        F: FnOnce(&mut ConfigMap),
    {
        let mut varz = self.varz.write().await;
        f(&mut varz.custom);
        varz.custom.retain(|key, _| !Varz::is_reserved(key));
    }

    async fn refresh_varz(&self, now: Instant) {
        let uptime = Uptime::from(now.saturating_duration_since(self.started));
        let sample = match self.probe.sample().await {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!(error = %e, "host probe failed; keeping previous mem/cpu");
                None
            }
        };

        let mut varz = self.varz.write().await;
        varz.uptime = varz.uptime.max(uptime);
        if let Some(sample) = sample {
            varz.mem = sample.mem_kb;
            varz.cpu = sample.cpu_percent;
        }
        debug!(uptime = %varz.uptime, mem = varz.mem, cpu = varz.cpu, "varz refreshed");
    }
}
