//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, logout and the current user,
//! plus the cookie helpers shared with the auth middleware.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use study_planner_core::domain::{CurrentUser, NewUser, User};
use study_planner_core::ports::PortError;
use study_planner_core::seed::DEMO_USERNAME;
use study_planner_core::validation::{LoginForm, RegisterForm};
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::ApiJson;
use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "session";

//=========================================================================================
// Helpers
//=========================================================================================

/// Hashes a password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Reads the auth session id out of the request's Cookie header.
pub fn session_id_from(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

fn session_cookie(auth_session_id: &str, ttl: Duration) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        ttl.num_seconds()
    )
}

/// The demo account's name belongs to guest access; nobody can register or rename into it.
pub(crate) fn check_username_claimable(username: &str) -> Result<(), ApiError> {
    if username.eq_ignore_ascii_case(DEMO_USERNAME) {
        return Err(PortError::Conflict(format!("Username {} is reserved", username)).into());
    }
    Ok(())
}

/// Creates an auth session row for `user_id` and returns the matching Set-Cookie value.
async fn start_session(state: &AppState, user_id: i64) -> Result<String, ApiError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    state
        .db
        .create_auth_session(&auth_session_id, user_id, Utc::now() + ttl)
        .await?;
    Ok(session_cookie(&auth_session_id, ttl))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account and sign it in
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterForm,
    responses(
        (status = 201, description = "User created successfully", body = User),
        (status = 409, description = "Username already taken", body = ErrorBody),
        (status = 422, description = "Invalid form", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    check_username_claimable(&form.username)?;

    let hashed_password = hash_password(&form.password)?;
    let user = state
        .db
        .create_user(NewUser {
            username: form.username,
            email: form.email,
            first_name: form.first_name.unwrap_or_default(),
            last_name: form.last_name.unwrap_or_default(),
            hashed_password,
        })
        .await?;
    info!("Registered user {} ({})", user.username, user.id);

    let cookie = start_session(&state, user.id).await?;
    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(user)))
}

/// POST /api/auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginForm,
    responses(
        (status = 200, description = "Login successful", body = User),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 422, description = "Invalid form", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;

    let creds = match state.db.get_user_by_username(&form.username).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(PortError::Unauthorized.into()),
        Err(e) => return Err(e.into()),
    };
    if !verify_password(&form.password, &creds.hashed_password)? {
        return Err(PortError::Unauthorized.into());
    }

    let user = state.db.get_user(creds.user_id).await?;
    let cookie = start_session(&state, user.id).await?;
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(user)))
}

/// POST /api/auth/logout - Invalidate the session and clear the cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Logged out")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(auth_session_id) = session_id_from(&headers) {
        state.db.delete_auth_session(auth_session_id).await?;
    }
    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

/// GET /api/auth/me - The user this request acts for
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not signed in", body = ErrorBody)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.db.get_user(user.id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_id_is_read_from_any_cookie_position() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc-123; lang=en"),
        );
        assert_eq!(session_id_from(&headers), Some("abc-123"));
    }

    #[test]
    fn empty_or_missing_session_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_id_from(&headers), None);
    }

    #[test]
    fn passwords_verify_against_their_hash() {
        let hashed = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hashed).unwrap());
        assert!(!verify_password("secret2", &hashed).unwrap());
    }

    #[test]
    fn session_cookie_carries_the_ttl() {
        let cookie = session_cookie("abc", Duration::days(1));
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.ends_with("Max-Age=86400"));
    }
}
