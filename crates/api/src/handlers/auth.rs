//! Handlers for the `/auth` resource: register, login, refresh, logout, and
//! logout-all.
//!
//! The access token travels in the response body and comes back in the
//! `Authorization` header. The refresh token travels only in an HttpOnly,
//! SameSite=Strict cookie scoped to the auth routes, so page scripts can
//! never read it; the CSRF token returned in the body must be echoed in the
//! `X-CSRF-Token` header on cookie-authenticated requests (refresh).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use gatehouse_core::token::{
    derive_device_fingerprint, generate_csrf_token, generate_secure_token, hash_token,
    REFRESH_TOKEN_BYTES,
};
use gatehouse_core::types::{DbId, Timestamp};
use gatehouse_core::CoreError;
use gatehouse_db::models::refresh_token::CreateRefreshToken;
use gatehouse_db::models::session::CreateSession;
use gatehouse_db::models::user::{CreateUser, User, UserRole};
use gatehouse_db::repositories::{RefreshTokenRepo, SessionRepo, UserRepo};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::auth::rate_limit;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Name of the refresh-token cookie.
pub const REFRESH_COOKIE: &str = "gatehouse_refresh";

/// Cookie path: the refresh token is only ever sent to the auth routes.
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

/// Header carrying the CSRF token on cookie-authenticated requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Opt into the long refresh-token lifetime.
    #[serde(default)]
    pub remember_me: bool,
}

/// Successful authentication response returned by register, login, and
/// refresh. The refresh token itself is delivered only via the cookie.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Echo this in the `X-CSRF-Token` header on refresh requests.
    pub csrf_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub email: String,
    pub role: String,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl UserInfo {
    fn from_user(user: &User) -> Self {
        UserInfo {
            id: user.id,
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Response body for `POST /auth/logout-all`.
#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub revoked_tokens: u64,
    pub invalidated_sessions: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account and establish the first session.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    crate::auth::password::validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    if UserRepo::find_by_email(&state.pool, &input.email)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "Email already registered".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email.trim().to_lowercase(),
            password_hash,
            role: UserRole::User,
        },
    )
    .await?;
    tracing::info!(user_id = user.id, "user registered");

    let refresh_days = state.config.jwt.refresh_expiry_days(false);
    let (jar, response) = issue_session(&state, jar, &user, refresh_days, &headers).await?;
    Ok((jar, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Both unknown-email and wrong-password
/// produce the identical 401 so accounts cannot be enumerated.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let identifier = input.email.trim().to_lowercase();
    let origin = client_ip(&headers).unwrap_or_else(|| "unknown".to_string());

    // 1. Rate-limit gate before touching credentials at all.
    if rate_limit::is_blocked(&state.pool, &state.config.rate_limit, &identifier, &origin).await? {
        tracing::warn!(identifier = %identifier, origin = %origin, "login rate limit exceeded");
        return Err(AppError::Core(CoreError::RateLimited(
            "Too many failed login attempts. Try again later.".into(),
        )));
    }

    // 2. Find the user. A miss is recorded and rejected with the same
    //    message as a wrong password.
    let Some(user) = UserRepo::find_by_email(&state.pool, &identifier).await? else {
        rate_limit::record_attempt(&state.pool, &identifier, &origin, false).await?;
        tracing::debug!(identifier = %identifier, "login failed: unknown email");
        return Err(AppError::Core(CoreError::invalid_credentials()));
    };

    // 3. Verify the password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        rate_limit::record_attempt(&state.pool, &identifier, &origin, false).await?;
        tracing::debug!(user_id = user.id, "login failed: wrong password");
        return Err(AppError::Core(CoreError::invalid_credentials()));
    }

    // 4. Success: record the attempt and the login time.
    rate_limit::record_attempt(&state.pool, &identifier, &origin, true).await?;
    UserRepo::update_last_login(&state.pool, user.id).await?;

    let refresh_days = state.config.jwt.refresh_expiry_days(input.remember_me);
    let (jar, response) = issue_session(&state, jar, &user, refresh_days, &headers).await?;
    tracing::info!(user_id = user.id, remember_me = input.remember_me, "user logged in");
    Ok((jar, Json(response)))
}

/// POST /api/v1/auth/refresh
///
/// Exchange the refresh-token cookie for a new access token, rotating the
/// refresh token and its session in one transaction.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    // 1. The refresh token arrives only via its cookie.
    let Some(cookie) = jar.get(REFRESH_COOKIE) else {
        tracing::debug!("refresh failed: no refresh token cookie");
        return Err(invalid_refresh_token());
    };
    let presented = cookie.value().to_string();

    // 2. Ledger lookup filters revoked rows; expiry is checked here so it
    //    can be logged distinctly.
    let token_hash = hash_token(&presented);
    let Some(old_token) = RefreshTokenRepo::find_by_hash(&state.pool, &token_hash).await? else {
        tracing::debug!("refresh failed: token not found or revoked");
        return Err(invalid_refresh_token());
    };

    if old_token.is_expired(Utc::now()) {
        tracing::debug!(user_id = old_token.user_id, "refresh failed: token expired");
        return Err(invalid_refresh_token());
    }

    // 3. The session bound to this token must still be live.
    let Some(session) =
        SessionRepo::find_active_by_refresh_token_id(&state.pool, old_token.id).await?
    else {
        tracing::debug!(user_id = old_token.user_id, "refresh failed: no active session");
        return Err(invalid_refresh_token());
    };

    // 4. Cookie-based identity requires the CSRF double-submit header.
    let presented_csrf = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !SessionRepo::verify_csrf(&state.pool, session.id, presented_csrf).await? {
        tracing::warn!(user_id = session.user_id, session_id = session.id, "refresh failed: CSRF mismatch");
        return Err(invalid_refresh_token());
    }

    // 5. Fingerprint drift is a signal, not a block.
    let current_ip = client_ip(&headers);
    let current_agent = user_agent(&headers);
    if SessionRepo::detect_suspicious(
        &state.pool,
        session.id,
        current_ip.as_deref(),
        current_agent.as_deref(),
    )
    .await?
    {
        tracing::warn!(
            user_id = session.user_id,
            session_id = session.id,
            "refresh from changed device context"
        );
    }

    // 6. A missing user is fatal to the whole session lineage.
    let Some(user) = UserRepo::find_by_id(&state.pool, old_token.user_id).await? else {
        RefreshTokenRepo::revoke_by_hash(&state.pool, &token_hash).await?;
        SessionRepo::invalidate(&state.pool, session.id).await?;
        tracing::warn!(user_id = old_token.user_id, "refresh failed: user no longer exists");
        return Err(invalid_refresh_token());
    };

    // 7. Rotate. Revoking the old token carries a `revoked = false` guard,
    //    so of two concurrent refresh calls with the same token exactly one
    //    commits; the loser rolls back and is rejected.
    let window = old_token.expires_at - old_token.created_at;
    let plaintext = generate_secure_token(REFRESH_TOKEN_BYTES);
    let csrf_token = generate_csrf_token();
    let expires_at = Utc::now() + window;

    let mut tx = state.pool.begin().await?;

    if !RefreshTokenRepo::revoke_by_id(&mut *tx, old_token.id).await? {
        tx.rollback().await?;
        tracing::debug!(user_id = user.id, "refresh failed: lost rotation race");
        return Err(invalid_refresh_token());
    }
    SessionRepo::invalidate(&mut *tx, session.id).await?;

    let new_token = RefreshTokenRepo::create(
        &mut *tx,
        &CreateRefreshToken {
            user_id: user.id,
            token_hash: hash_token(&plaintext),
            expires_at,
            device_info: current_agent.clone(),
            ip_address: current_ip.clone(),
        },
    )
    .await?;
    let new_session = SessionRepo::create(
        &mut *tx,
        &CreateSession {
            user_id: user.id,
            refresh_token_id: new_token.id,
            csrf_token: csrf_token.clone(),
            expires_at,
            ip_address: current_ip.clone(),
            user_agent: current_agent.clone(),
            device_fingerprint: fingerprint(current_agent.as_deref(), current_ip.as_deref()),
        },
    )
    .await?;

    tx.commit().await?;

    let access_token = generate_access_token(
        user.id,
        &user.email,
        user.role.as_str(),
        new_session.id,
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let jar = jar.add(refresh_cookie(&state, plaintext, window.num_seconds()));
    tracing::info!(user_id = user.id, session_id = new_session.id, "refresh token rotated");

    Ok((
        jar,
        Json(AuthResponse {
            access_token,
            csrf_token,
            expires_in: state.config.jwt.access_token_expiry_mins * 60,
            user: UserInfo::from_user(&user),
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Tear down the caller's session: invalidate it, revoke its refresh token,
/// blacklist the presented access token, and clear the cookie. Logging out
/// twice is not an error. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(session) = SessionRepo::find_by_id(&state.pool, auth_user.session_id).await? {
        if session.user_id == auth_user.user_id {
            SessionRepo::invalidate(&state.pool, session.id).await?;
            RefreshTokenRepo::revoke_by_id(&state.pool, session.refresh_token_id).await?;
        }
    }

    // Best effort: the access token dies early if the cache is reachable,
    // otherwise it simply ages out at its natural expiry.
    state.revocation.blacklist(&auth_user.token).await;

    tracing::info!(user_id = auth_user.user_id, session_id = auth_user.session_id, "user logged out");
    Ok((clear_refresh_cookie(jar), StatusCode::NO_CONTENT))
}

/// POST /api/v1/auth/logout-all
///
/// Revoke every refresh token and invalidate every session for the caller.
/// Returns the counts for observability. Outstanding access tokens (other
/// than the presented one) remain valid until their short expiry.
pub async fn logout_all(
    State(state): State<AppState>,
    auth_user: AuthUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<LogoutAllResponse>)> {
    let revoked_tokens = RefreshTokenRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    let invalidated_sessions =
        SessionRepo::invalidate_all_for_user(&state.pool, auth_user.user_id).await?;

    state.revocation.blacklist(&auth_user.token).await;

    tracing::info!(
        user_id = auth_user.user_id,
        revoked_tokens,
        invalidated_sessions,
        "logout-all completed"
    );

    Ok((
        clear_refresh_cookie(jar),
        Json(LogoutAllResponse {
            revoked_tokens,
            invalidated_sessions,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The uniform client-visible rejection for every refresh failure mode.
fn invalid_refresh_token() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid or expired refresh token".into(),
    ))
}

/// Create a refresh token + session pair in one transaction, mint the access
/// token, and set the refresh cookie.
async fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
    refresh_days: i64,
    headers: &HeaderMap,
) -> AppResult<(CookieJar, AuthResponse)> {
    let plaintext = generate_secure_token(REFRESH_TOKEN_BYTES);
    let csrf_token = generate_csrf_token();
    let expires_at = Utc::now() + chrono::Duration::days(refresh_days);
    let ip_address = client_ip(headers);
    let user_agent = user_agent(headers);

    let mut tx = state.pool.begin().await?;

    let token = RefreshTokenRepo::create(
        &mut *tx,
        &CreateRefreshToken {
            user_id: user.id,
            token_hash: hash_token(&plaintext),
            expires_at,
            device_info: user_agent.clone(),
            ip_address: ip_address.clone(),
        },
    )
    .await?;
    let session = SessionRepo::create(
        &mut *tx,
        &CreateSession {
            user_id: user.id,
            refresh_token_id: token.id,
            csrf_token: csrf_token.clone(),
            expires_at,
            ip_address: ip_address.clone(),
            user_agent: user_agent.clone(),
            device_fingerprint: fingerprint(user_agent.as_deref(), ip_address.as_deref()),
        },
    )
    .await?;

    tx.commit().await?;

    let access_token = generate_access_token(
        user.id,
        &user.email,
        user.role.as_str(),
        session.id,
        &state.config.jwt,
    )
    .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let jar = jar.add(refresh_cookie(state, plaintext, refresh_days * 24 * 3600));

    Ok((
        jar,
        AuthResponse {
            access_token,
            csrf_token,
            expires_in: state.config.jwt.access_token_expiry_mins * 60,
            user: UserInfo::from_user(user),
        },
    ))
}

/// Build the HttpOnly refresh-token cookie.
fn refresh_cookie(state: &AppState, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Remove the refresh cookie. The removal cookie must carry the same path.
fn clear_refresh_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((REFRESH_COOKIE, "")).path(REFRESH_COOKIE_PATH).build())
}

/// Device fingerprint from the request context, when both parts are present.
fn fingerprint(user_agent: Option<&str>, ip: Option<&str>) -> Option<String> {
    match (user_agent, ip) {
        (Some(ua), Some(ip)) => Some(derive_device_fingerprint(ua, ip)),
        _ => None,
    }
}

/// Best-effort client IP: first `X-Forwarded-For` hop, then `X-Real-IP`.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The `User-Agent` header, if present.
pub(crate) fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
