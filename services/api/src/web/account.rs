//! services/api/src/web/account.rs
//!
//! Profile and settings endpoints behind the settings page.

use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use study_planner_core::domain::{CurrentUser, User, UserSettings};
use study_planner_core::validation::{ProfileForm, SettingsForm};
use tracing::info;
use validator::Validate;

use crate::error::{ApiError, ErrorBody};
use crate::web::auth::check_username_claimable;
use crate::web::extract::ApiJson;
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "account",
    responses((status = 200, description = "The current user's profile", body = User))
)]
pub async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.db.get_user(user.id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/user",
    tag = "account",
    request_body = ProfileForm,
    responses(
        (status = 200, description = "Profile saved", body = User),
        (status = 409, description = "Username already taken", body = ErrorBody),
        (status = 422, description = "Invalid form", body = ErrorBody)
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(form): ApiJson<ProfileForm>,
) -> Result<Json<User>, ApiError> {
    form.validate()?;
    if form.username != user.username {
        check_username_claimable(&form.username)?;
    }
    let updated = state.db.update_user(user.id, form.into()).await?;
    info!("User {} updated their profile", user.id);
    Ok(Json(updated))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "account",
    responses((status = 200, description = "Saved settings, or the defaults", body = UserSettings))
)]
pub async fn get_settings_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.db.get_settings(user.id).await?))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "account",
    request_body = SettingsForm,
    responses(
        (status = 200, description = "Settings saved", body = UserSettings),
        (status = 422, description = "A duration is out of range", body = ErrorBody)
    )
)]
pub async fn save_settings_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(form): ApiJson<SettingsForm>,
) -> Result<Json<UserSettings>, ApiError> {
    form.validate()?;
    let saved = state.db.save_settings(user.id, form.into()).await?;
    Ok(Json(saved))
}
