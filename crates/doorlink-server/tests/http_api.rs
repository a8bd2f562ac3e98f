//! HTTP API tests against an in-memory store and the loopback transport.
//!
//! Run with: cargo test --package doorlink-server --test http_api

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use doorlink_engine::{AccessEngine, EngineConfig, spawn_router};
use doorlink_network::LoopbackTransport;
use doorlink_protocol::Topic;
use doorlink_server::{AppState, build_router};
use doorlink_storage::{Database, seed_default_users};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    engine: Arc<AccessEngine>,
    transport: Arc<LoopbackTransport>,
    shutdown: CancellationToken,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn test_app_with(config: EngineConfig) -> TestApp {
    let db = Database::in_memory().await.unwrap();
    seed_default_users(&db).await.unwrap();

    let (tx, rx) = mpsc::channel(64);
    let transport = Arc::new(LoopbackTransport::new(tx).recording().without_echo());
    let engine = AccessEngine::new(config, &db, transport.clone()).unwrap();
    engine.tracker().initialize().await.unwrap();

    let shutdown = CancellationToken::new();
    spawn_router(engine.clone(), rx, shutdown.clone());

    TestApp {
        app: build_router(AppState::new(engine.clone(), db)),
        engine,
        transport,
        shutdown,
    }
}

async fn test_app() -> TestApp {
    test_app_with(EngineConfig::default()).await
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn wait_for_pending(engine: &AccessEngine) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while engine.pending_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("request never reached the registry");
}

#[tokio::test]
async fn test_health_endpoints() {
    let t = test_app().await;

    let (status, body) = send(&t.app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&t.app, Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["pendingRequests"], 0);
}

#[tokio::test]
async fn test_unknown_code_denied() {
    let t = test_app().await;

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/access/request",
        Some(json!({"code": "0000"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], false);
    assert_eq!(body["status"], "invalid-code");
    assert_eq!(body["reason"], "Invalid access code");
    assert!(body["userId"].is_null());
    assert_eq!(t.engine.pending_count(), 0);
}

#[tokio::test]
async fn test_inactive_user_denied() {
    let t = test_app().await;

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/access/request",
        Some(json!({"code": "9999"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], false);
    assert_eq!(body["status"], "inactive-user");
    assert_eq!(body["userName"], "Usuario2");
}

#[tokio::test]
async fn test_missing_code_is_bad_request() {
    let t = test_app().await;

    let (status, body) = send(&t.app, Method::POST, "/api/access/request", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = send(
        &t.app,
        Method::POST,
        "/api/access/request",
        Some(json!({"code": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/access/request")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_granted_after_sensor_confirmation() {
    let t = test_app().await;

    let app = t.app.clone();
    let call = tokio::spawn(async move {
        send(
            &app,
            Method::POST,
            "/api/access/request",
            Some(json!({"code": "1234"})),
        )
        .await
    });

    wait_for_pending(&t.engine).await;
    let published = t.transport.published_on(Topic::OpenRequest);
    assert_eq!(published.len(), 1);
    let command: Value = serde_json::from_str(published[0].text()).unwrap();
    let request_id = command["requestId"].as_str().unwrap().to_string();

    t.transport
        .inject(
            Topic::SensorStatus.as_str(),
            json!({"requestId": request_id, "doorOpened": true, "event": "door_opened"})
                .to_string(),
        )
        .await
        .unwrap();

    let (status, body) = call.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], true);
    assert_eq!(body["status"], "access-granted");
    assert_eq!(body["userName"], "Admin");
    assert_eq!(body["manual"], false);
    assert_eq!(body["requestId"], request_id.as_str());

    let (status, door) = send(&t.app, Method::GET, "/api/doors/status/realtime", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(door["state"], "open");
    assert_eq!(door["isOpen"], true);
    assert_eq!(door["isClosed"], false);
}

#[tokio::test]
async fn test_timeout_answers_gateway_timeout() {
    let config = EngineConfig::default().request_timeout(Duration::from_millis(150));
    let t = test_app_with(config).await;

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/access/request",
        Some(json!({"code": "5678"})),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["granted"], false);
    assert_eq!(body["status"], "timeout");
    assert_eq!(body["userName"], "Usuario1");
    assert_eq!(t.engine.pending_count(), 0);
}

#[tokio::test]
async fn test_manual_open() {
    let t = test_app().await;

    let app = t.app.clone();
    let call = tokio::spawn(async move {
        send(
            &app,
            Method::POST,
            "/api/doors/open/manual",
            Some(json!({"adminName": "Laura"})),
        )
        .await
    });

    wait_for_pending(&t.engine).await;
    let published = t.transport.published_on(Topic::OpenRequest);
    let command: Value = serde_json::from_str(published[0].text()).unwrap();
    assert_eq!(command["manual"], true);
    let request_id = command["requestId"].as_str().unwrap().to_string();

    t.transport
        .inject(
            Topic::SensorStatus.as_str(),
            json!({"requestId": request_id, "doorOpened": true}).to_string(),
        )
        .await
        .unwrap();

    let (status, body) = call.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], true);
    assert_eq!(body["status"], "manual-open");
    assert_eq!(body["manual"], true);
    assert_eq!(body["userName"], "Laura");
}

#[tokio::test]
async fn test_door_status() {
    let t = test_app().await;

    let (status, door) = send(&t.app, Method::GET, "/api/doors/status/realtime", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(door["doorId"], "Puerta Principal");
    assert_eq!(door["state"], "closed");
    assert_eq!(door["lastEvent"], "initialized");
    assert_eq!(door["isClosed"], true);
    assert!(door["lastEventTs"].is_string());

    let (status, door) = send(
        &t.app,
        Method::GET,
        "/api/doors/Puerta%20Principal/status",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(door["state"], "closed");
    assert!(door.get("isOpen").is_none());

    let (status, body) = send(&t.app, Method::GET, "/api/doors/Garaje/status", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_access_logs() {
    let t = test_app().await;

    for code in ["0000", "9999"] {
        send(
            &t.app,
            Method::POST,
            "/api/access/request",
            Some(json!({"code": code})),
        )
        .await;
    }

    let (status, logs) = send(&t.app, Method::GET, "/api/access/logs", None).await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["status"], "inactive-user");
    assert_eq!(logs[1]["status"], "invalid-code");

    let (_, logs) = send(&t.app, Method::GET, "/api/access/logs?limit=1", None).await;
    assert_eq!(logs.as_array().unwrap().len(), 1);

    let (status, _) = send(&t.app, Method::GET, "/api/access/logs?limit=lots", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unauthorized_listing() {
    let t = test_app().await;

    t.transport
        .inject(
            Topic::SensorStatus.as_str(),
            json!({"doorOpened": true, "event": "door_opened"}).to_string(),
        )
        .await
        .unwrap();

    let unauthorized = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (_, logs) = send(&t.app, Method::GET, "/api/access/unauthorized", None).await;
            if !logs.as_array().unwrap().is_empty() {
                break logs;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("unsolicited opening was never recorded");

    let entries = unauthorized.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "unauthorized-access");
    assert_eq!(entries[0]["granted"], false);
    assert!(entries[0]["userId"].is_null());
}

#[tokio::test]
async fn test_user_crud() {
    let t = test_app().await;

    let (status, users) = send(&t.app, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 3);

    let (status, created) = send(
        &t.app,
        Method::POST,
        "/api/users",
        Some(json!({"name": "Lucia", "accessCode": "4321"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Lucia");
    assert_eq!(created["isActive"], true);
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/users",
        Some(json!({"name": "Otra", "accessCode": "4321"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(
        &t.app,
        Method::POST,
        "/api/users",
        Some(json!({"name": "Sin codigo"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = send(
        &t.app,
        Method::PUT,
        &format!("/api/users/{id}"),
        Some(json!({"isActive": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isActive"], false);
    assert_eq!(updated["name"], "Lucia");
    assert_eq!(updated["accessCode"], "4321");

    let (status, _) = send(
        &t.app,
        Method::PUT,
        &format!("/api/users/{id}"),
        Some(json!({"accessCode": "1234"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &t.app,
        Method::PUT,
        "/api/users/9999",
        Some(json!({"name": "Nadie"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&t.app, Method::DELETE, &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted");

    let (status, _) = send(&t.app, Method::DELETE, &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, Method::DELETE, "/api/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_door_id_is_bad_request() {
    let t = test_app().await;
    let door_id = "x".repeat(200);

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/access/request",
        Some(json!({"code": "1234", "doorId": door_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(t.engine.pending_count(), 0);
}
