//! Request-level tests for the HTTP surface.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::router;
use crate::notifier::Notifier;
use crate::power::PowerExecutor;
use crate::test_support::{ScriptedTransport, inventory};
use crate::vsphere::{Credentials, VsphereClient};

#[fixture]
fn transport() -> ScriptedTransport {
    ScriptedTransport::new()
}

fn executor_with(transport: &ScriptedTransport, credentials: Credentials) -> PowerExecutor {
    let client = VsphereClient::new(
        "https://vsphere.local",
        credentials,
        Arc::new(transport.clone()),
    );
    PowerExecutor::new(client, Notifier::disabled())
}

fn executor(transport: &ScriptedTransport) -> PowerExecutor {
    executor_with(
        transport,
        Credentials::new(
            None,
            Some(String::from("admin")),
            Some(String::from("secret")),
        ),
    )
}

fn push_inventory(transport: &ScriptedTransport) {
    transport.push_json(&inventory(&[
        ("vm-1", "web", "POWERED_OFF"),
        ("vm-2", "db", "POWERED_ON"),
    ]));
}

async fn call(
    executor: PowerExecutor,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let request = builder
        .body(Body::empty())
        .expect("request should build");

    let response = router(executor)
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body = serde_json::from_slice(&bytes).expect("body should be JSON");
    (status, body)
}

#[rstest]
#[tokio::test]
async fn health_reports_ok(transport: ScriptedTransport) {
    let (status, body) = call(executor(&transport), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
    assert!(transport.requests().is_empty());
}

#[rstest]
#[tokio::test]
async fn power_state_is_reported(transport: ScriptedTransport) {
    transport.push_login("token-1");
    push_inventory(&transport);
    transport.push_ok();

    let (status, body) = call(executor(&transport), Method::GET, "/power/web", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "ok", "state": "POWERED_OFF" }));
}

#[rstest]
#[tokio::test]
async fn power_state_is_echoed_in_upstream_spelling(transport: ScriptedTransport) {
    transport.push_login("token-1");
    transport.push_json(&inventory(&[("vm-1", "web", "poweredOff")]));
    transport.push_ok();

    let (status, body) = call(executor(&transport), Method::GET, "/power/web", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "ok", "state": "poweredOff" }));
}

#[rstest]
#[case("/power/on/web", "start")]
#[case("/power/off/web", "stop")]
#[case("/power/reset/web", "reset")]
#[case("/power/suspend/web", "suspend")]
#[tokio::test]
async fn power_routes_apply_their_action(
    transport: ScriptedTransport,
    #[case] uri: &str,
    #[case] action: &str,
) {
    transport.push_login("token-1");
    push_inventory(&transport);
    transport.push_ok();
    transport.push_ok();

    let (status, body) = call(executor(&transport), Method::POST, uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "ok" }));
    assert!(
        transport
            .request_lines()
            .contains(&format!("POST /api/object/vm-1/power?action={action}"))
    );
}

#[rstest]
#[tokio::test]
async fn cycle_route_stops_then_starts(transport: ScriptedTransport) {
    for token in ["token-1", "token-2"] {
        transport.push_login(token);
        push_inventory(&transport);
        transport.push_ok();
        transport.push_ok();
    }

    let (status, body) = call(executor(&transport), Method::POST, "/power/cycle/web", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "ok" }));
    let actions: Vec<String> = transport
        .request_lines()
        .into_iter()
        .filter(|line| line.contains("/power?action="))
        .collect();
    assert_eq!(
        actions,
        [
            "POST /api/object/vm-1/power?action=stop",
            "POST /api/object/vm-1/power?action=start",
        ]
    );
}

#[rstest]
#[tokio::test]
async fn unknown_machines_map_to_not_found(transport: ScriptedTransport) {
    transport.push_login("token-1");
    push_inventory(&transport);
    transport.push_ok();

    let (status, body) = call(executor(&transport), Method::POST, "/power/on/missing", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({ "error": "unable to power on virtual machine: virtual machine missing not found" })
    );
}

#[rstest]
#[tokio::test]
async fn missing_credentials_map_to_unauthorised(transport: ScriptedTransport) {
    let executor = executor_with(&transport, Credentials::default());

    let (status, body) = call(executor, Method::GET, "/power/web", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert!(transport.requests().is_empty());
}

#[rstest]
#[tokio::test]
async fn upstream_rejections_map_to_bad_gateway(transport: ScriptedTransport) {
    transport.push_status(503, "maintenance");

    let (status, body) = call(executor(&transport), Method::POST, "/power/off/web", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(message.ends_with("maintenance"), "message: {message}");
}

#[rstest]
#[tokio::test]
async fn inbound_authorization_is_forwarded_to_login(transport: ScriptedTransport) {
    transport.push_login("token-1");
    push_inventory(&transport);
    transport.push_ok();
    let executor = executor_with(&transport, Credentials::default());

    let (status, _) = call(executor, Method::GET, "/power/db", Some("Basic caller")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        transport.requests()[0].header("authorization"),
        Some("Basic caller")
    );
}
