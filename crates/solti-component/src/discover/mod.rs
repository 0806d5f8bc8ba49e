//! Announce/discover protocol over the bus.
use std::{sync::Arc, time::Instant};

use solti_model::{Credentials, DiscoveryDocument, Identity, Uptime};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    bus::{Bus, Subscription},
    clock::Clock,
    error::ComponentError,
};

/// Subject peers send discover requests on.
pub const DISCOVER_SUBJECT: &str = "component.discover";

/// Subject a component announces itself on after registering.
pub const ANNOUNCE_SUBJECT: &str = "component.announce";

/// Owns the discovery document and answers discover requests with it.
pub struct DiscoveryAnnouncer {
    clock: Arc<dyn Clock>,
    started: Instant,
    document: Mutex<DiscoveryDocument>,
}

impl DiscoveryAnnouncer {
    /// Build the announcer for a freshly registered component.
    ///
    /// `started` anchors uptime and should come from `clock`.
    pub fn build(
        identity: &Identity,
        credentials: &Credentials,
        clock: Arc<dyn Clock>,
        started: Instant,
    ) -> Self {
        Self {
            clock,
            started,
            document: Mutex::new(DiscoveryDocument::new(identity, credentials)),
        }
    }

    /// Recompute the uptime field in place.
    pub async fn refresh_uptime(&self) {
        let mut doc = self.document.lock().await;
        self.refresh_locked(&mut doc);
    }

    /// Copy of the document as last refreshed.
    pub async fn document(&self) -> DiscoveryDocument {
        self.document.lock().await.clone()
    }

    /// Publish the document on [`ANNOUNCE_SUBJECT`].
    pub async fn announce(&self, bus: &dyn Bus) -> Result<(), ComponentError> {
        let payload = self.refreshed_payload().await?;
        bus.publish(ANNOUNCE_SUBJECT, payload).await?;
        debug!(subject = ANNOUNCE_SUBJECT, "component announced");
        Ok(())
    }

    /// Answer a single discover request on its reply subject.
    pub async fn handle_discover_request(
        &self,
        bus: &dyn Bus,
        reply_subject: &str,
    ) -> Result<(), ComponentError> {
        let payload = self.refreshed_payload().await?;
        bus.publish(reply_subject, payload).await?;
        debug!(reply = reply_subject, "discover request answered");
        Ok(())
    }

    /// Subscribe to [`DISCOVER_SUBJECT`].
    ///
    /// Fails fast when the bus is not connected.
    pub async fn subscribe(&self, bus: &dyn Bus) -> Result<Subscription, ComponentError> {
        if !bus.is_connected() {
            return Err(ComponentError::BusNotConnected);
        }
        Ok(bus.subscribe(DISCOVER_SUBJECT).await?)
    }

    /// Answer discover requests from `subscription` until `shutdown` fires or the bus goes away.
    pub fn serve(
        self: Arc<Self>,
        bus: Arc<dyn Bus>,
        mut subscription: Subscription,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    msg = subscription.next() => {
                        let Some(msg) = msg else {
                            debug!(subject = DISCOVER_SUBJECT, "discover subscription closed");
                            break;
                        };
                        let Some(reply) = msg.reply.as_deref() else {
                            debug!(
                                subject = %msg.subject,
                                "discover request without reply subject ignored"
                            );
                            continue;
                        };
                        if let Err(e) = self.handle_discover_request(bus.as_ref(), reply).await {
                            warn!(error = %e, reply, "failed to answer discover request");
                        }
                    }
                }
            }
        })
    }

    async fn refreshed_payload(&self) -> Result<Vec<u8>, ComponentError> {
        let mut doc = self.document.lock().await;
        self.refresh_locked(&mut doc);
        Ok(serde_json::to_vec(&*doc)?)
    }

    fn refresh_locked(&self, doc: &mut DiscoveryDocument) {
        let elapsed = self.clock.now().saturating_duration_since(self.started);
        doc.uptime = doc.uptime.max(Uptime::from(elapsed));
    }
}
