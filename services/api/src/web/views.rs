//! services/api/src/web/views.rs
//!
//! Read-only endpoints that compose the derived views: the dashboard, progress
//! statistics, the schedule and the next pomodoro phase. The rows are fetched
//! here; the arithmetic lives in `study_planner_core::views`.

use axum::{extract::State, Extension, Json};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_planner_core::domain::{CurrentUser, StudySession, Task};
use study_planner_core::pomodoro::{next_phase, PhasePlan, PomodoroPhase};
use study_planner_core::views::{
    build_dashboard, compute_stats, today_sessions, upcoming_deadlines, DashboardInput,
    DashboardView, PriorityFilter, StudyStats,
};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::ApiQuery;
use crate::web::state::AppState;

/// How many deadlines the schedule page lists; the dashboard shows fewer.
pub const SCHEDULE_DEADLINE_LIMIT: usize = 20;

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// One of all, high, medium, low.
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PomodoroQuery {
    /// Focus blocks finished so far, including the one that just ended.
    #[serde(default)]
    pub completed: u32,
    pub current: PomodoroPhase,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub date: NaiveDate,
    pub today: Vec<StudySession>,
    pub upcoming_deadlines: Vec<Task>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "views",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Everything the dashboard page renders", body = DashboardView),
        (status = 400, description = "Unknown priority filter", body = ErrorBody)
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<DashboardView>, ApiError> {
    let filter = match query.priority.as_deref() {
        None | Some("") => PriorityFilter::default(),
        Some(raw) => raw
            .parse::<PriorityFilter>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    };

    let profile = state.db.get_user(user.id).await?;
    let subjects = state.planner.subjects(&user).await?;
    let tasks = state.planner.tasks(&user).await?;
    let sessions = state.planner.study_sessions(&user).await?;
    let records = state.planner.study_time_records(&user).await?;
    let settings = state.db.get_settings(user.id).await?;

    Ok(Json(build_dashboard(DashboardInput {
        user: &profile,
        today: today(),
        filter,
        subjects: &subjects,
        tasks: &tasks,
        sessions: &sessions,
        records: &records,
        settings,
    })))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "views",
    responses((status = 200, description = "Study statistics for the current week", body = StudyStats))
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<StudyStats>, ApiError> {
    let tasks = state.planner.tasks(&user).await?;
    let records = state.planner.study_time_records(&user).await?;
    Ok(Json(compute_stats(&records, &tasks, today())))
}

#[utoipa::path(
    get,
    path = "/api/schedule",
    tag = "views",
    responses((status = 200, description = "Today's sessions and upcoming deadlines", body = ScheduleView))
)]
pub async fn schedule_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ScheduleView>, ApiError> {
    let date = today();
    let sessions = state.planner.study_sessions(&user).await?;
    let tasks = state.planner.tasks(&user).await?;
    Ok(Json(ScheduleView {
        date,
        today: today_sessions(&sessions, date),
        upcoming_deadlines: upcoming_deadlines(&tasks, date, SCHEDULE_DEADLINE_LIMIT),
    }))
}

#[utoipa::path(
    get,
    path = "/api/pomodoro/next",
    tag = "views",
    params(PomodoroQuery),
    responses((status = 200, description = "The phase to run next and its length", body = PhasePlan))
)]
pub async fn pomodoro_next_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<PomodoroQuery>,
) -> Result<Json<PhasePlan>, ApiError> {
    let settings = state.db.get_settings(user.id).await?;
    Ok(Json(next_phase(&settings, query.completed, query.current)))
}
