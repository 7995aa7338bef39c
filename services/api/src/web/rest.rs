//! services/api/src/web/rest.rs
//!
//! Assembles the REST API router and holds the master definition for the
//! OpenAPI specification.

use crate::error::ErrorBody;
use crate::web::{account, auth, middleware::require_auth, resources, sample_data, shell, state::AppState, views};
use axum::{
    handler::Handler,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use study_planner_core::domain::{
    NewStudySession, NewStudyTimeRecord, NewSubject, Priority, StudySession, StudySessionPatch,
    StudyTimeRecord, StudyTimeRecordPatch, Subject, SubjectPatch, Task, TaskPatch, User,
    UserSettings,
};
use study_planner_core::pomodoro::{PhasePlan, PomodoroPhase};
use study_planner_core::seed::SeedSummary;
use study_planner_core::validation::{
    AppSettingsForm, LoginForm, PomodoroSettingsForm, ProfileForm, RegisterForm, SettingsForm,
    TaskForm,
};
use study_planner_core::views::{DashboardView, PriorityFilter, StatCard, StudyStats, TaskEntry};
use tower_http::services::ServeDir;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        account::get_profile_handler,
        account::update_profile_handler,
        account::get_settings_handler,
        account::save_settings_handler,
        resources::list_subjects_handler,
        resources::get_subject_handler,
        resources::create_subject_handler,
        resources::update_subject_handler,
        resources::delete_subject_handler,
        resources::list_tasks_handler,
        resources::get_task_handler,
        resources::task_subject_handler,
        resources::create_task_handler,
        resources::replace_task_handler,
        resources::update_task_handler,
        resources::delete_task_handler,
        resources::list_study_sessions_handler,
        resources::get_study_session_handler,
        resources::create_study_session_handler,
        resources::update_study_session_handler,
        resources::delete_study_session_handler,
        resources::list_study_time_records_handler,
        resources::get_study_time_record_handler,
        resources::create_study_time_record_handler,
        resources::update_study_time_record_handler,
        resources::delete_study_time_record_handler,
        views::dashboard_handler,
        views::stats_handler,
        views::schedule_handler,
        views::pomodoro_next_handler,
        sample_data::sample_data_handler,
    ),
    components(
        schemas(
            ErrorBody,
            User, UserSettings, ProfileForm, SettingsForm, AppSettingsForm, PomodoroSettingsForm,
            LoginForm, RegisterForm,
            Subject, NewSubject, SubjectPatch,
            Priority, Task, TaskForm, TaskPatch,
            StudySession, NewStudySession, StudySessionPatch,
            StudyTimeRecord, NewStudyTimeRecord, StudyTimeRecordPatch,
            DashboardView, StatCard, TaskEntry, PriorityFilter, StudyStats, views::ScheduleView,
            PomodoroPhase, PhasePlan, SeedSummary,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and the session cookie."),
        (name = "account", description = "Profile and settings."),
        (name = "subjects", description = "Courses and topics tasks are filed under."),
        (name = "tasks", description = "Assignments with priority and due date."),
        (name = "study-sessions", description = "Scheduled study blocks."),
        (name = "study-time-records", description = "Logged study time."),
        (name = "views", description = "Dashboard, statistics, schedule and pomodoro."),
        (name = "sample-data", description = "Demo content for an empty planner.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the application router: public auth routes, the protected API and the
/// client shell as fallback. Cross-cutting layers (CORS, tracing, Swagger UI)
/// are added by the binary.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler));

    // Protected routes (a resolved CurrentUser is required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route(
            "/api/user",
            get(account::get_profile_handler).patch(account::update_profile_handler),
        )
        .route(
            "/api/settings",
            get(account::get_settings_handler).put(account::save_settings_handler),
        )
        .route(
            "/api/subjects",
            get(resources::list_subjects_handler).post(resources::create_subject_handler),
        )
        .route(
            "/api/subjects/{id}",
            get(resources::get_subject_handler)
                .patch(resources::update_subject_handler)
                .delete(resources::delete_subject_handler),
        )
        .route(
            "/api/tasks",
            get(resources::list_tasks_handler).post(resources::create_task_handler),
        )
        .route(
            "/api/tasks/{id}",
            get(resources::get_task_handler)
                .put(resources::replace_task_handler)
                .patch(resources::update_task_handler)
                .delete(resources::delete_task_handler),
        )
        .route("/api/tasks/{id}/subject", get(resources::task_subject_handler))
        .route(
            "/api/study-sessions",
            get(resources::list_study_sessions_handler)
                .post(resources::create_study_session_handler),
        )
        .route(
            "/api/study-sessions/{id}",
            get(resources::get_study_session_handler)
                .patch(resources::update_study_session_handler)
                .delete(resources::delete_study_session_handler),
        )
        .route(
            "/api/study-time-records",
            get(resources::list_study_time_records_handler)
                .post(resources::create_study_time_record_handler),
        )
        .route(
            "/api/study-time-records/{id}",
            get(resources::get_study_time_record_handler)
                .patch(resources::update_study_time_record_handler)
                .delete(resources::delete_study_time_record_handler),
        )
        .route("/api/dashboard", get(views::dashboard_handler))
        .route("/api/stats", get(views::stats_handler))
        .route("/api/schedule", get(views::schedule_handler))
        .route("/api/pomodoro/next", get(views::pomodoro_next_handler))
        .route("/api/sample-data", post(sample_data::sample_data_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Any method on an unknown path ends in the shell, which answers with a JSON 404.
    let client = ServeDir::new(&state.config.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(shell::client_shell_handler.with_state(state.clone()));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback_service(client)
        .with_state(state)
}
