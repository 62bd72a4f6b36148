#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use outreach_api::auth::jwt::{Claims, JwtConfig};
use outreach_api::config::ServerConfig;
use outreach_api::routes;
use outreach_api::state::AppState;
use outreach_core::roles::{ROLE_ADMIN, ROLE_EDITOR};
use outreach_events::EventBus;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_bus(pool, Arc::new(EventBus::default()))
}

pub fn build_test_app_with_bus(pool: PgPool, event_bus: Arc<EventBus>) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(test_config()),
        event_bus,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn token_for(role: &str, secret: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: format!("{role}-user"),
        role: role.to_string(),
        exp: now + 600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn admin_token() -> String {
    token_for(ROLE_ADMIN, TEST_SECRET)
}

pub fn editor_token() -> String {
    token_for(ROLE_EDITOR, TEST_SECRET)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value, token: &str) -> Response {
    send(app, Method::POST, uri, Some(json), Some(token)).await
}

pub async fn put_json(app: Router, uri: &str, json: serde_json::Value, token: &str) -> Response {
    send(app, Method::PUT, uri, Some(json), Some(token)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, None, Some(token)).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
