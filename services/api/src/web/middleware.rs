//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use study_planner_core::domain::CurrentUser;
use study_planner_core::ports::PortError;
use study_planner_core::seed::{demo_user, DEMO_PASSWORD, DEMO_USERNAME};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::web::auth::{hash_password, session_id_from};
use crate::web::state::AppState;

/// Middleware that resolves the `CurrentUser` for the request.
///
/// A valid session cookie wins. Without one, guest access (when enabled) signs the
/// request in as the demo user, creating it on first use. Otherwise the request is
/// rejected with 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_user(&state, req.headers()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Works out who a request acts for from its headers.
pub async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, ApiError> {
    match session_id_from(headers) {
        Some(auth_session_id) => {
            let user_id = state
                .db
                .validate_auth_session(auth_session_id)
                .await
                .map_err(|e| {
                    warn!("Rejected auth session: {:?}", e);
                    PortError::Unauthorized
                })?;
            let user = state.db.get_user(user_id).await?;
            Ok(CurrentUser {
                id: user.id,
                username: user.username,
            })
        }
        None if state.config.guest_access => guest_user(state).await,
        None => Err(PortError::Unauthorized.into()),
    }
}

/// Looks up the demo account, creating it the first time a guest shows up.
async fn guest_user(state: &AppState) -> Result<CurrentUser, ApiError> {
    let user_id = match state.db.get_user_by_username(DEMO_USERNAME).await {
        Ok(creds) => creds.user_id,
        Err(PortError::NotFound(_)) => {
            let upsert = state
                .db
                .ensure_user(demo_user(hash_password(DEMO_PASSWORD)?))
                .await?;
            if upsert.inserted {
                info!("Created demo user {} ({})", DEMO_USERNAME, upsert.row.id);
            }
            upsert.row.id
        }
        Err(e) => return Err(e.into()),
    };
    Ok(CurrentUser {
        id: user_id,
        username: DEMO_USERNAME.to_string(),
    })
}
