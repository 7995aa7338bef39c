//! services/api/src/web/sample_data.rs
//!
//! The "Add Sample Data" action on the empty dashboard.

use axum::{extract::State, Extension, Json};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use study_planner_core::domain::CurrentUser;
use study_planner_core::seed::{daily_seed, seed_sample_data, SeedSummary};
use tracing::info;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;
use crate::web::views::today;

/// Populates the current user's planner with demo rows.
///
/// Safe to repeat: rows are matched on their natural keys and the random study
/// history is drawn from a generator seeded by user and day.
#[utoipa::path(
    post,
    path = "/api/sample-data",
    tag = "sample-data",
    responses(
        (status = 200, description = "Counts of sample rows now present", body = SeedSummary),
        (status = 404, description = "The current user no longer exists", body = ErrorBody)
    )
)]
pub async fn sample_data_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<SeedSummary>, ApiError> {
    let today = today();
    let mut rng = StdRng::seed_from_u64(daily_seed(user.id, today));
    let summary = seed_sample_data(state.db.as_ref(), &user, today, &mut rng).await?;
    info!(
        "Sample data for user {}: {} subjects, {} tasks, {} sessions, {} records",
        user.id,
        summary.subjects_count,
        summary.tasks_count,
        summary.sessions_count,
        summary.records_count
    );
    Ok(Json(summary))
}
