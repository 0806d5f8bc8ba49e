//! Component registration: identity, HTTP exposure and discovery wired together.
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use solti_model::{Credentials, DiscoveryDocument, Identity, Varz};
use time::OffsetDateTime;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    bus::{Bus, default_bus},
    clock::{Clock, SystemClock},
    discover::DiscoveryAnnouncer,
    error::ComponentError,
    http::HttpExposer,
    probe::{HostProbe, SysinfoProbe},
    sanitize::ConfigSanitizer,
    stats::StatsCache,
    system::{num_cores, resolve_host},
};

mod options;
pub use options::ComponentOptions;

/// Entry point for registering a component.
///
/// One registry hands out at most one live registration.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    registered: AtomicBool,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the component: start `/healthz` + `/varz`, answer discover requests, announce.
    ///
    /// A failed registration leaves nothing running and may be retried.
    #[instrument(level = "info", skip(self, options), fields(kind = %options.kind))]
    pub async fn register(&self, options: ComponentOptions) -> Result<Component, ComponentError> {
        if self.registered.swap(true, Ordering::AcqRel) {
            return Err(ComponentError::AlreadyRegistered);
        }
        let result = register_component(options).await;
        if result.is_err() {
            self.registered.store(false, Ordering::Release);
        }
        result
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }
}

/// Handle to a registered component.
///
/// Dropping the handle stops the HTTP endpoint and the discover responder;
/// [`Component::shutdown`] does the same and waits for both to finish.
pub struct Component {
    identity: Identity,
    credentials: Credentials,
    http_addr: SocketAddr,
    stats: Arc<StatsCache>,
    announcer: Arc<DiscoveryAnnouncer>,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Component {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn uuid(&self) -> &str {
        &self.identity.uuid
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Address the HTTP endpoint is actually bound to.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn stats(&self) -> &Arc<StatsCache> {
        &self.stats
    }

    pub fn announcer(&self) -> &Arc<DiscoveryAnnouncer> {
        &self.announcer
    }

    pub async fn set_healthz(&self, value: impl Into<String>) {
        self.stats.set_healthz(value).await;
    }

    /// Stop serving and wait for background tasks to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(error = %e, "component task ended abnormally");
            }
        }
        info!(uuid = %self.identity.uuid, "component stopped");
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn register_component(options: ComponentOptions) -> Result<Component, ComponentError> {
    let ComponentOptions {
        kind,
        host,
        port,
        bus,
        config,
        denied_keys,
        healthz,
        probe,
        clock,
    } = options;
    if kind.trim().is_empty() {
        return Err(ComponentError::InvalidConfig(
            "component type cannot be empty".into(),
        ));
    }

    // 1) Identity tokens.
    let uuid = new_token();
    let credentials = Credentials::new(new_token(), new_token());

    // 2) Host and port. Binding here reserves the port; serving starts once a runtime is confirmed.
    let host = resolve_host(host.as_deref());
    let std_listener = bind_listener(&host, port.unwrap_or(0))?;
    let port = std_listener
        .local_addr()
        .map_err(|source| ComponentError::Bind {
            addr: format!("{host}:0"),
            source,
        })?
        .port();

    // 3) Identity and discovery document.
    let clock: Arc<dyn Clock> = clock.unwrap_or_else(|| Arc::new(SystemClock));
    let started = clock.now();
    let identity = Identity {
        kind,
        uuid,
        host,
        port,
        start: OffsetDateTime::now_utc(),
    };
    let announcer = Arc::new(DiscoveryAnnouncer::build(
        &identity,
        &credentials,
        Arc::clone(&clock),
        started,
    ));

    // 4) Initial varz/healthz.
    let sanitizer = denied_keys
        .iter()
        .fold(ConfigSanitizer::default(), |s, key| s.with_denied(key));
    let mut varz = Varz::seeded(
        &DiscoveryDocument::new(&identity, &credentials),
        num_cores(),
    );
    varz.config = config.map(|c| sanitizer.sanitize(&c));
    let probe: Arc<dyn HostProbe> = probe.unwrap_or_else(|| Arc::new(SysinfoProbe::current()));
    let stats = Arc::new(
        StatsCache::new(varz, Arc::clone(&clock), probe, started).with_healthz_provider(healthz),
    );

    // 5) Everything below needs a reactor.
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(ComponentError::NoRuntime);
    }

    // 6) HTTP endpoint.
    let listener = TcpListener::from_std(std_listener).map_err(|source| ComponentError::Bind {
        addr: identity.address(),
        source,
    })?;
    let http_addr = listener.local_addr().map_err(|source| ComponentError::Bind {
        addr: identity.address(),
        source,
    })?;
    let shutdown = CancellationToken::new();
    let server = HttpExposer::new(credentials.clone(), Arc::clone(&stats))
        .start(listener, shutdown.child_token());
    debug!(%http_addr, "http exposer started");

    // 7) + 8) Discover subscription, then announce. Replies only start after the announce.
    let responder = match start_discovery(bus, &announcer, &shutdown).await {
        Ok(responder) => responder,
        Err(e) => {
            shutdown.cancel();
            if let Err(join) = server.await {
                warn!(error = %join, "http exposer ended abnormally during rollback");
            }
            return Err(e);
        }
    };

    info!(
        uuid = %identity.uuid,
        kind = %identity.kind,
        address = %identity.address(),
        "component registered"
    );
    Ok(Component {
        identity,
        credentials,
        http_addr,
        stats,
        announcer,
        shutdown,
        tasks: vec![server, responder],
    })
}

async fn start_discovery(
    bus: Option<Arc<dyn Bus>>,
    announcer: &Arc<DiscoveryAnnouncer>,
    shutdown: &CancellationToken,
) -> Result<JoinHandle<()>, ComponentError> {
    let bus = bus.or_else(default_bus).ok_or(ComponentError::NoBus)?;
    let subscription = announcer.subscribe(bus.as_ref()).await?;
    announcer.announce(bus.as_ref()).await?;
    Ok(Arc::clone(announcer).serve(bus, subscription, shutdown.child_token()))
}

fn bind_listener(host: &str, port: u16) -> Result<std::net::TcpListener, ComponentError> {
    let bind_err = |source| ComponentError::Bind {
        addr: format!("{host}:{port}"),
        source,
    };
    let listener = std::net::TcpListener::bind((host, port)).map_err(bind_err)?;
    listener.set_nonblocking(true).map_err(bind_err)?;
    Ok(listener)
}

/// Opaque, unguessable token for instance ids and credentials.
fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}
