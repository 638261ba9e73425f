//! HTTP-level integration tests for session management and the admin
//! blacklist endpoints.

mod common;

use axum::http::{Method, StatusCode};
use sqlx::PgPool;

use common::{body_json, login_user, register_user, TestRequest};

// ---------------------------------------------------------------------------
// Session listing
// ---------------------------------------------------------------------------

/// Listing sessions shows every live session and marks the caller's own.
#[sqlx::test(migrations = "../db/migrations")]
async fn list_sessions_marks_current(pool: PgPool) {
    let app = common::build_test_app(pool);
    register_user(&app, "alice@example.com", "Secret123!").await;
    let (second, _) = login_user(&app, "alice@example.com", "Secret123!").await;

    let response = TestRequest::new(Method::GET, "/api/v1/auth/sessions")
        .bearer(second["access_token"].as_str().unwrap())
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let sessions = body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);

    let current: Vec<_> = sessions
        .iter()
        .filter(|s| s["current"].as_bool().unwrap())
        .collect();
    assert_eq!(current.len(), 1, "exactly one session is the caller's own");

    // No session internals leak into the listing.
    for session in sessions {
        assert!(session.get("csrf_token").is_none());
        assert!(session.get("refresh_token_id").is_none());
        assert!(session.get("device_fingerprint").is_none());
    }
}

/// Sessions require a bearer token; a garbage token is rejected uniformly.
#[sqlx::test(migrations = "../db/migrations")]
async fn list_sessions_requires_auth(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = TestRequest::new(Method::GET, "/api/v1/auth/sessions")
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = TestRequest::new(Method::GET, "/api/v1/auth/sessions")
        .bearer("not.a.jwt")
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Remote session revocation
// ---------------------------------------------------------------------------

/// Revoking one of your own sessions kills that session and its refresh
/// token; the surviving session is untouched.
#[sqlx::test(migrations = "../db/migrations")]
async fn revoke_own_session(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (first, first_cookie) = register_user(&app, "alice@example.com", "Secret123!").await;
    let first_csrf = first["csrf_token"].as_str().unwrap();
    let (second, _) = login_user(&app, "alice@example.com", "Secret123!").await;
    let bearer = second["access_token"].as_str().unwrap();

    // From the second session, find and revoke the first.
    let response = TestRequest::new(Method::GET, "/api/v1/auth/sessions")
        .bearer(bearer)
        .send(&app)
        .await;
    let body = body_json(response).await;
    let other_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| !s["current"].as_bool().unwrap())
        .and_then(|s| s["id"].as_i64())
        .expect("the other session must be listed");

    let response = TestRequest::new(Method::DELETE, &format!("/api/v1/auth/sessions/{other_id}"))
        .bearer(bearer)
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The first session's refresh token is dead.
    let refresh = TestRequest::new(Method::POST, "/api/v1/auth/refresh")
        .refresh_cookie(&first_cookie)
        .csrf(first_csrf)
        .send(&app)
        .await;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);

    // Only the caller's session remains.
    let response = TestRequest::new(Method::GET, "/api/v1/auth/sessions")
        .bearer(bearer)
        .send(&app)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

/// Unknown session id yields 404; another user's session yields 403 and is
/// left intact.
#[sqlx::test(migrations = "../db/migrations")]
async fn revoke_session_ownership(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (alice, _) = register_user(&app, "alice@example.com", "Secret123!").await;
    let (bob, _) = register_user(&app, "bob@example.com", "Hunter246!").await;
    let bob_bearer = bob["access_token"].as_str().unwrap();

    let response = TestRequest::new(Method::DELETE, "/api/v1/auth/sessions/999999")
        .bearer(bob_bearer)
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Find Alice's session id directly.
    let alice_id = alice["user"]["id"].as_i64().unwrap();
    let (alice_session_id,): (i64,) =
        sqlx::query_as("SELECT id FROM sessions WHERE user_id = $1")
            .bind(alice_id)
            .fetch_one(&pool)
            .await
            .unwrap();

    let response =
        TestRequest::new(Method::DELETE, &format!("/api/v1/auth/sessions/{alice_session_id}"))
            .bearer(bob_bearer)
            .send(&app)
            .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Alice's session is still active.
    let response = TestRequest::new(Method::GET, "/api/v1/auth/sessions")
        .bearer(alice["access_token"].as_str().unwrap())
        .send(&app)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Admin blacklist endpoints
// ---------------------------------------------------------------------------

/// Promote a registered user to admin and log in again so the new role is
/// baked into the access token.
async fn make_admin(app: &axum::Router, pool: &PgPool, email: &str, password: &str) -> String {
    register_user(app, email, password).await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await
        .unwrap();
    let (login, _) = login_user(app, email, password).await;
    login["access_token"].as_str().unwrap().to_string()
}

/// Non-admins get 403 from the blacklist endpoints.
#[sqlx::test(migrations = "../db/migrations")]
async fn blacklist_requires_admin(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (user, _) = register_user(&app, "alice@example.com", "Secret123!").await;

    let response = TestRequest::new(Method::GET, "/api/v1/admin/blacklist")
        .bearer(user["access_token"].as_str().unwrap())
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Blacklist count reflects logouts; clearing resurrects blacklisted access
/// tokens until their natural expiry.
#[sqlx::test(migrations = "../db/migrations")]
async fn blacklist_count_and_clear(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let admin = make_admin(&app, &pool, "root@example.com", "Sup3rSecret!").await;

    let response = TestRequest::new(Method::GET, "/api/v1/admin/blacklist")
        .bearer(&admin)
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 0);

    // A logout puts the user's access token on the blacklist.
    let (user, _) = register_user(&app, "alice@example.com", "Secret123!").await;
    let user_token = user["access_token"].as_str().unwrap();
    let response = TestRequest::new(Method::POST, "/api/v1/auth/logout")
        .bearer(user_token)
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = TestRequest::new(Method::GET, "/api/v1/admin/blacklist")
        .bearer(&admin)
        .send(&app)
        .await;
    assert_eq!(body_json(response).await["count"], 1);

    let rejected = TestRequest::new(Method::GET, "/api/v1/auth/sessions")
        .bearer(user_token)
        .send(&app)
        .await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    // Clearing empties the blacklist and the token verifies again.
    let response = TestRequest::new(Method::DELETE, "/api/v1/admin/blacklist")
        .bearer(&admin)
        .send(&app)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 1);

    let restored = TestRequest::new(Method::GET, "/api/v1/auth/sessions")
        .bearer(user_token)
        .send(&app)
        .await;
    assert_eq!(restored.status(), StatusCode::OK);
}
