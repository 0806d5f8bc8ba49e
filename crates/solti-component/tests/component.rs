mod common;

use std::time::Duration;

use serde_json::{Value, json};
use solti_component::{
    ANNOUNCE_SUBJECT, Bus, Component, DISCOVER_SUBJECT, DiscoveryDocument, Uptime, Varz,
};

use common::{Harness, REPLY_TIMEOUT, authed_get, http_get};

const VARZ_KEYS: &[&str] = &[
    "type",
    "uuid",
    "host",
    "credentials",
    "start",
    "uptime",
    "num_cores",
    "mem",
    "cpu",
];

async fn varz_json(component: &Component) -> Value {
    let body = authed_get(component, "/varz").await.text().await.unwrap();
    serde_json::from_str(&body).unwrap()
}

#[tokio::test]
async fn announces_once_on_registration() {
    let h = Harness::new();
    let mut announcements = h.bus.subscribe(ANNOUNCE_SUBJECT).await.unwrap();

    let component = h.register(h.options("router")).await;

    let msg = tokio::time::timeout(REPLY_TIMEOUT, announcements.next())
        .await
        .expect("announce should arrive")
        .expect("bus open");
    let doc: DiscoveryDocument = serde_json::from_slice(&msg.payload).unwrap();
    assert_eq!(doc.uuid, component.uuid());
    assert_eq!(doc.kind, "router");
    assert_eq!(doc.host, format!("127.0.0.1:{}", component.http_addr().port()));
    assert_eq!(&doc.credentials, component.credentials());

    let second =
        tokio::time::timeout(Duration::from_millis(100), announcements.next()).await;
    assert!(second.is_err(), "only one announce per registration");

    component.shutdown().await;
}

#[tokio::test]
async fn discover_request_gets_exactly_one_reply() {
    let h = Harness::new();
    let component = h.register(h.options("router")).await;

    let mut inbox = h.bus.subscribe("inbox.discover.1").await.unwrap();
    h.bus
        .publish_request(DISCOVER_SUBJECT, "inbox.discover.1", Vec::new())
        .await
        .unwrap();

    let reply = tokio::time::timeout(REPLY_TIMEOUT, inbox.next())
        .await
        .expect("reply should arrive")
        .expect("bus open");
    let raw: Value = serde_json::from_slice(&reply.payload).unwrap();
    for key in ["type", "uuid", "host", "credentials", "start", "uptime"] {
        assert!(raw.get(key).is_some(), "missing {key}");
    }
    assert_eq!(raw["uuid"], component.uuid());
    assert_eq!(raw["type"], "router");
    let uptime: Uptime = raw["uptime"].as_str().unwrap().parse().unwrap();
    assert_eq!(uptime.as_secs(), 0);

    let extra = tokio::time::timeout(Duration::from_millis(100), inbox.next()).await;
    assert!(extra.is_err(), "exactly one reply per request");

    component.shutdown().await;
}

#[tokio::test]
async fn discover_uptime_is_recomputed_per_request() {
    let h = Harness::new();
    let component = h.register(h.options("router")).await;

    let first = h
        .bus
        .request(DISCOVER_SUBJECT, Vec::new(), REPLY_TIMEOUT)
        .await
        .unwrap();
    h.clock.advance(Duration::from_secs(2));
    let second = h
        .bus
        .request(DISCOVER_SUBJECT, Vec::new(), REPLY_TIMEOUT)
        .await
        .unwrap();

    let first: DiscoveryDocument = serde_json::from_slice(&first.payload).unwrap();
    let second: DiscoveryDocument = serde_json::from_slice(&second.payload).unwrap();
    assert!(second.uptime.as_secs() - first.uptime.as_secs() >= 2);
    assert_eq!(first.uuid, second.uuid);

    component.shutdown().await;
}

#[tokio::test]
async fn every_discover_request_is_answered() {
    let h = Harness::new();
    let component = h.register(h.options("dea")).await;

    for _ in 0..5 {
        let reply = h
            .bus
            .request(DISCOVER_SUBJECT, Vec::new(), REPLY_TIMEOUT)
            .await
            .unwrap();
        let doc: DiscoveryDocument = serde_json::from_slice(&reply.payload).unwrap();
        assert_eq!(doc.kind, "dea");
    }
    component.shutdown().await;
}

#[tokio::test]
async fn router_config_is_sanitized_in_varz() {
    let h = Harness::new();
    let opts = h
        .options("router")
        .with_config(&json!({"mbus": "nats://x", "token": "abc"}))
        .unwrap();
    let component = h.register(opts).await;

    let response = authed_get(&component, "/varz").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body = response.text().await.unwrap();
    assert!(body.ends_with('\n'));

    let varz: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(varz["config"], json!({"token": "abc"}));
    for key in VARZ_KEYS {
        assert!(varz.get(key).is_some(), "missing {key}");
    }

    component.shutdown().await;
}

#[tokio::test]
async fn varz_round_trips_initial_snapshot() {
    let h = Harness::new();
    let opts = h
        .options("router")
        .with_config(&json!({"index": 3, "nested": {"keys": ["not", "top-level"]}}))
        .unwrap();
    let component = h.register(opts).await;
    let initial = component.stats().peek_varz().await;

    h.clock.advance(Duration::from_secs(5));
    let body = authed_get(&component, "/varz").await.text().await.unwrap();
    let served: Varz = serde_json::from_str(&body).unwrap();

    assert_eq!(served.kind, initial.kind);
    assert_eq!(served.uuid, initial.uuid);
    assert_eq!(served.host, initial.host);
    assert_eq!(served.credentials, initial.credentials);
    assert_eq!(served.start, initial.start);
    assert_eq!(served.num_cores, initial.num_cores);
    assert_eq!(served.config, initial.config);
    assert_eq!(served.custom, initial.custom);
    assert_eq!(served.uptime.as_secs(), 5);
    assert_eq!(served.mem, 4097);

    component.shutdown().await;
}

#[tokio::test]
async fn varz_requests_within_a_second_share_one_probe_call() {
    let h = Harness::new();
    let component = h.register(h.options("router")).await;

    let a = varz_json(&component).await;
    let b = varz_json(&component).await;
    assert_eq!(h.probe.calls(), 1);
    assert_eq!(a["mem"], b["mem"]);
    assert_eq!(a["cpu"], b["cpu"]);

    h.clock.advance(Duration::from_secs(1));
    authed_get(&component, "/varz").await;
    assert_eq!(h.probe.calls(), 2);

    component.shutdown().await;
}

#[tokio::test]
async fn healthz_serves_last_set_value() {
    let h = Harness::new();
    let component = h.register(h.options("router")).await;

    let response = authed_get(&component, "/healthz").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/plaintext");
    assert_eq!(response.text().await.unwrap(), "ok\n");

    component.set_healthz("degraded\n").await;
    let body = authed_get(&component, "/healthz").await.text().await.unwrap();
    assert_eq!(body, "degraded\n");

    component.shutdown().await;
}

#[tokio::test]
async fn dynamic_healthz_provider_is_used() {
    let h = Harness::new();
    let component = h
        .register(h.options("router").with_healthz(|| "busy\n".to_string()))
        .await;

    let body = authed_get(&component, "/healthz").await.text().await.unwrap();
    assert_eq!(body, "busy\n");
    component.shutdown().await;
}

#[tokio::test]
async fn bad_credentials_never_reach_the_cache() {
    let h = Harness::new();
    let component = h.register(h.options("router")).await;
    let user = component.credentials().username().to_string();

    for path in ["/varz", "/healthz"] {
        let response = http_get(&component, path, &user, "wrong").await;
        assert_eq!(response.status(), 401);
        let response = http_get(&component, path, "nobody", "nothing").await;
        assert_eq!(response.status(), 401);
    }
    let anonymous = reqwest::get(format!("http://{}/varz", component.http_addr()))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 401);
    assert_eq!(h.probe.calls(), 0);

    component.shutdown().await;
}

#[tokio::test]
async fn custom_varz_fields_are_served() {
    let h = Harness::new();
    let component = h.register(h.options("router")).await;
    component
        .stats()
        .set_varz_field("requests", 42)
        .await
        .unwrap();

    let varz = varz_json(&component).await;
    assert_eq!(varz["requests"], 42);
    component.shutdown().await;
}

#[tokio::test]
async fn independent_registrations_coexist() {
    let h = Harness::new();
    let a = h.register(h.options("router")).await;
    let b = h.register(h.options("dea")).await;

    assert_ne!(a.uuid(), b.uuid());
    assert_ne!(a.http_addr(), b.http_addr());
    assert_ne!(a.credentials(), b.credentials());

    let mut inbox = h.bus.subscribe("inbox.all").await.unwrap();
    h.bus
        .publish_request(DISCOVER_SUBJECT, "inbox.all", Vec::new())
        .await
        .unwrap();
    let mut kinds = Vec::new();
    for _ in 0..2 {
        let msg = tokio::time::timeout(REPLY_TIMEOUT, inbox.next())
            .await
            .unwrap()
            .unwrap();
        let doc: DiscoveryDocument = serde_json::from_slice(&msg.payload).unwrap();
        kinds.push(doc.kind);
    }
    kinds.sort();
    assert_eq!(kinds, ["dea", "router"]);

    a.shutdown().await;
    b.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_http_and_discovery() {
    let h = Harness::new();
    let component = h.register(h.options("router")).await;
    let addr = component.http_addr();
    component.shutdown().await;

    assert!(reqwest::get(format!("http://{addr}/healthz")).await.is_err());
    assert_eq!(h.bus.subscribers(DISCOVER_SUBJECT).await, 0);
    let err = h
        .bus
        .request(DISCOVER_SUBJECT, Vec::new(), Duration::from_millis(100))
        .await;
    assert!(err.is_err());
}
