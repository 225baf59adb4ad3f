mod support;

use std::time::Duration;

use ecodash::auth::{AuthError, GuardState, RedirectReason, Scope};
use ecodash::error::{EcodashError, PermissionDenial};
use ecodash::gateway::ApiRequest;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{grant_json, Harness};

const DASHBOARD: &str = "/api/v1/admin/dashboard";
const REFRESH: &str = "/api/v1/auth/refresh";

async fn mount_refresh(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(header("authorization", "Bearer refresh-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(grant_json("access-2", "refresh-2", 3600))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn attaches_bearer_and_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", "Bearer access-1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let resp = gateway
        .get(format!("{}{DASHBOARD}", server.uri()))
        .await
        .expect("request");

    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn unauthorized_refreshes_once_and_replays_with_new_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, 1).await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Session);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let resp = gateway
        .get(format!("{}{DASHBOARD}", server.uri()))
        .await
        .expect("replayed request");

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(guard.store().access_token().as_deref(), Some("access-2"));
    assert_eq!(guard.store().refresh_token().as_deref(), Some("refresh-2"));
    assert_eq!(guard.state(), GuardState::Protected);
    assert!(harness.navigator.calls().is_empty());
}

#[tokio::test]
async fn replay_is_attempted_only_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, 1).await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let resp = gateway
        .get(format!("{}{DASHBOARD}", server.uri()))
        .await
        .expect("second 401 is returned, not retried");

    assert_eq!(resp.status().as_u16(), 401);
    assert!(harness.storage.is_empty());
    assert_eq!(guard.state(), GuardState::Redirecting);
    assert_eq!(harness.navigator.reasons(), vec![RedirectReason::SessionExpired]);
}

#[tokio::test]
async fn failed_refresh_ends_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let err = gateway
        .get(format!("{}{DASHBOARD}", server.uri()))
        .await
        .expect_err("session should end");

    assert!(matches!(err, EcodashError::Auth(AuthError::SessionExpired)));
    assert!(harness.storage.is_empty());
    assert_eq!(guard.state(), GuardState::Redirecting);
    assert_eq!(harness.navigator.reasons(), vec![RedirectReason::SessionExpired]);
    assert_eq!(harness.navigator.calls()[0].0, "/index.html");
}

#[tokio::test]
async fn refresh_bad_request_ends_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid refresh token"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Session);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let err = gateway
        .get(format!("{}{DASHBOARD}", server.uri()))
        .await
        .expect_err("session should end");

    assert!(matches!(err, EcodashError::Auth(AuthError::SessionExpired)));
    assert!(harness.storage.is_empty());
    assert_eq!(guard.state(), GuardState::Redirecting);
    assert_eq!(harness.navigator.reasons(), vec![RedirectReason::SessionExpired]);
}

#[tokio::test]
async fn unreachable_refresh_endpoint_ends_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let mut harness = Harness::new(&server.uri());
    // Nothing listens on the discard port.
    harness.config.endpoints.refresh = "http://127.0.0.1:9/api/v1/auth/refresh".to_string();
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let err = gateway
        .get(format!("{}{DASHBOARD}", server.uri()))
        .await
        .expect_err("session should end");

    assert!(matches!(err, EcodashError::Auth(AuthError::SessionExpired)));
    assert!(harness.storage.is_empty());
    assert_eq!(guard.state(), GuardState::Redirecting);
    assert_eq!(harness.navigator.reasons(), vec![RedirectReason::SessionExpired]);
}

#[tokio::test]
async fn missing_refresh_token_ends_the_session_without_calling_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", None, Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let err = gateway
        .get(format!("{}{DASHBOARD}", server.uri()))
        .await
        .expect_err("session should end");

    assert!(err.is_session_terminal());
    assert!(harness.storage.is_empty());
}

#[tokio::test]
async fn concurrent_unauthorized_calls_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, 1).await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");
    let url = format!("{}{DASHBOARD}", server.uri());

    let (first, second) = tokio::join!(gateway.get(url.clone()), gateway.get(url.clone()));

    assert_eq!(first.expect("first").status().as_u16(), 200);
    assert_eq!(second.expect("second").status().as_u16(), 200);
    assert!(harness.navigator.calls().is_empty());
}

#[tokio::test]
async fn forbidden_is_returned_unchanged_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "Admin access required"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, 0).await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let resp = gateway
        .get(format!("{}{DASHBOARD}", server.uri()))
        .await
        .expect("403 is not an error at the gateway");
    assert_eq!(resp.status().as_u16(), 403);
    let body = resp.text().await.expect("body");

    assert_eq!(
        PermissionDenial::from_body(&body),
        PermissionDenial::AdminAccessRequired
    );
    assert_eq!(guard.store().access_token().as_deref(), Some("access-1"));
    assert_eq!(guard.state(), GuardState::Protected);
}

#[tokio::test]
async fn foreign_urls_get_no_credentials_and_no_refresh() {
    let api = MockServer::start().await;
    let foreign = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(|req: &wiremock::Request| {
            if req.headers.contains_key("authorization") {
                ResponseTemplate::new(500)
            } else {
                ResponseTemplate::new(401)
            }
        })
        .expect(1)
        .mount(&foreign)
        .await;
    mount_refresh(&api, 0).await;
    let harness = Harness::new(&api.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let resp = gateway
        .send(ApiRequest::get(format!("{}/feed", foreign.uri())))
        .await
        .expect("pass-through");

    assert_eq!(resp.status().as_u16(), 401);
    assert_eq!(guard.state(), GuardState::Protected);
}

#[tokio::test]
async fn caller_supplied_authorization_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .and(header("authorization", "Bearer custom"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Persistent);
    let guard = harness.guard();
    let gateway = guard.protect().expect("session is valid");

    let request = ApiRequest::get(format!("{}{DASHBOARD}", server.uri()))
        .header(AUTHORIZATION, HeaderValue::from_static("Bearer custom"));
    let resp = gateway.send(request).await.expect("request");

    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn preserve_login_scope_keeps_session_logins_out_of_persistent_storage() {
    use ecodash::auth::{RefreshCoordinator, RefreshScopePolicy, ScopedStorage};

    let server = MockServer::start().await;
    mount_refresh(&server, 1).await;
    let harness = Harness::new(&server.uri());
    harness.seed("access-1", Some("refresh-1"), Some(3600), Scope::Session);
    let refresher = RefreshCoordinator::new(
        reqwest::Client::new(),
        format!("{}{REFRESH}", server.uri()),
        harness.store(),
    )
    .with_policy(RefreshScopePolicy::PreserveLoginScope);

    let bundle = refresher.refresh().await.expect("refresh");

    assert_eq!(bundle.access_token, "access-2");
    assert_eq!(
        harness
            .storage
            .get(Scope::Persistent, "access_token")
            .expect("read"),
        None
    );
    assert_eq!(
        harness
            .storage
            .get(Scope::Session, "access_token")
            .expect("read")
            .as_deref(),
        Some("access-2")
    );
}
