//! Shared helpers for HTTP integration tests.
//!
//! Mirrors the router construction in `main.rs` so tests exercise the same
//! middleware stack production uses, with an in-process revocation cache and
//! a fixed JWT secret.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use gatehouse_api::auth::jwt::JwtConfig;
use gatehouse_api::auth::rate_limit::RateLimitConfig;
use gatehouse_api::config::{RevocationConfig, ServerConfig};
use gatehouse_api::routes;
use gatehouse_api::state::AppState;
use gatehouse_cache::memory::MemoryBlacklist;
use gatehouse_cache::{FailPolicy, RevocationCache};

/// JWT secret used by every test app.
pub const TEST_JWT_SECRET: &str = "integration-test-secret-long-enough-for-hmac";

/// Name of the refresh cookie, re-exported for assertions.
pub const REFRESH_COOKIE: &str = "gatehouse_refresh";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
            remember_me_expiry_days: 30,
        },
        rate_limit: RateLimitConfig::default(),
        revocation: RevocationConfig {
            redis_url: None,
            fail_policy: FailPolicy::Open,
        },
        // Tests run over plain HTTP.
        cookie_secure: false,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and an in-process revocation cache.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let revocation = Arc::new(RevocationCache::new(
        Arc::new(MemoryBlacklist::new()),
        config.revocation.fail_policy,
    ));

    let state = AppState {
        pool,
        config: Arc::new(config),
        revocation,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
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

/// Builder for one test request, so individual tests read linearly.
pub struct TestRequest {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    bearer: Option<String>,
    cookie: Option<String>,
    csrf: Option<String>,
    headers: Vec<(String, String)>,
}

impl TestRequest {
    pub fn new(method: Method, path: &str) -> Self {
        TestRequest {
            method,
            path: path.to_string(),
            body: None,
            bearer: None,
            cookie: None,
            csrf: None,
            headers: Vec::new(),
        }
    }

    /// Attach an arbitrary header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    /// Attach the refresh cookie.
    pub fn refresh_cookie(mut self, value: &str) -> Self {
        self.cookie = Some(format!("{REFRESH_COOKIE}={value}"));
        self
    }

    pub fn csrf(mut self, token: &str) -> Self {
        self.csrf = Some(token.to_string());
        self
    }

    /// Send against a clone of the app and return the raw response.
    pub async fn send(self, app: &Router) -> Response<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.path);

        if let Some(token) = &self.bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(csrf) = &self.csrf {
            builder = builder.header("x-csrf-token", csrf);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let request = match self.body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request should build"),
            None => builder.body(Body::empty()).expect("request should build"),
        };

        app.clone()
            .oneshot(request)
            .await
            .expect("request should complete")
    }
}

/// POST a JSON body without authentication.
pub async fn post_json(app: &Router, path: &str, body: serde_json::Value) -> Response<Body> {
    TestRequest::new(Method::POST, path).json(body).send(app).await
}

/// Read the response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Extract the refresh-token value from a response's `Set-Cookie` headers.
///
/// Returns `None` when no non-empty refresh cookie was set (e.g. after
/// logout, which sets a removal cookie).
pub fn refresh_cookie_value(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| {
            let rest = v.strip_prefix(&format!("{REFRESH_COOKIE}="))?;
            let value = rest.split(';').next().unwrap_or("");
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        })
        .next()
}

/// Register a user via the API and return the JSON response plus the refresh
/// cookie value.
pub async fn register_user(
    app: &Router,
    email: &str,
    password: &str,
) -> (serde_json::Value, String) {
    let body = serde_json::json!({ "email": email, "password": password });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = refresh_cookie_value(&response).expect("register must set the refresh cookie");
    (body_json(response).await, cookie)
}

/// Log in via the API and return the JSON response plus the refresh cookie
/// value.
pub async fn login_user(
    app: &Router,
    email: &str,
    password: &str,
) -> (serde_json::Value, String) {
    let body = serde_json::json!({ "email": email, "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = refresh_cookie_value(&response).expect("login must set the refresh cookie");
    (body_json(response).await, cookie)
}
