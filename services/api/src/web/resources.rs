//! services/api/src/web/resources.rs
//!
//! CRUD handlers for the four planner resources: subjects, tasks, study sessions
//! and study-time records. Every handler acts for the `CurrentUser` placed in the
//! request extensions by `require_auth`; ownership checks live in `Planner`.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use study_planner_core::domain::{
    CurrentUser, NewStudySession, NewStudyTimeRecord, NewSubject, StudySession,
    StudySessionPatch, StudyTimeRecord, StudyTimeRecordPatch, Subject, SubjectPatch, Task,
    TaskPatch,
};
use study_planner_core::ports::PortError;
use study_planner_core::validation::TaskForm;
use tracing::info;
use validator::Validate;

use crate::error::{ApiError, ErrorBody};
use crate::web::extract::{ApiJson, ApiPath};
use crate::web::state::AppState;

//=========================================================================================
// Subjects
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/subjects",
    tag = "subjects",
    responses((status = 200, description = "All subjects of the current user", body = [Subject]))
)]
pub async fn list_subjects_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Subject>>, ApiError> {
    Ok(Json(state.planner.subjects(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/subjects/{id}",
    tag = "subjects",
    params(("id" = i64, Path, description = "Subject id")),
    responses(
        (status = 200, description = "The subject", body = Subject),
        (status = 404, description = "No such subject", body = ErrorBody)
    )
)]
pub async fn get_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Subject>, ApiError> {
    Ok(Json(state.planner.subject(&user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/subjects",
    tag = "subjects",
    request_body = NewSubject,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 409, description = "A subject with this name exists", body = ErrorBody)
    )
)]
pub async fn create_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(new_subject): ApiJson<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
    if new_subject.name.trim().is_empty() {
        return Err(PortError::Invalid("Subject name is required".to_string()).into());
    }
    let subject = state.planner.create_subject(&user, new_subject).await?;
    info!("User {} created subject {}", user.id, subject.id);
    Ok((StatusCode::CREATED, Json(subject)))
}

#[utoipa::path(
    patch,
    path = "/api/subjects/{id}",
    tag = "subjects",
    params(("id" = i64, Path, description = "Subject id")),
    request_body = SubjectPatch,
    responses(
        (status = 200, description = "Subject updated", body = Subject),
        (status = 404, description = "No such subject", body = ErrorBody),
        (status = 422, description = "Blank name", body = ErrorBody)
    )
)]
pub async fn update_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<SubjectPatch>,
) -> Result<Json<Subject>, ApiError> {
    if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(PortError::Invalid("Subject name is required".to_string()).into());
    }
    Ok(Json(state.planner.update_subject(&user, id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    tag = "subjects",
    params(("id" = i64, Path, description = "Subject id")),
    responses(
        (status = 204, description = "Subject deleted; its tasks and sessions are unfiled"),
        (status = 404, description = "No such subject", body = ErrorBody)
    )
)]
pub async fn delete_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.planner.delete_subject(&user, id).await?;
    info!("User {} deleted subject {}", user.id, id);
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Tasks
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    responses((status = 200, description = "All tasks of the current user", body = [Task]))
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.planner.tasks(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 404, description = "No such task", body = ErrorBody)
    )
)]
pub async fn get_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.planner.task(&user, id).await?))
}

/// The subject a task is filed under, or `null`.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/subject",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task's subject; null when the task has none", body = Subject),
        (status = 404, description = "No such task", body = ErrorBody)
    )
)]
pub async fn task_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Option<Subject>>, ApiError> {
    Ok(Json(state.planner.subject_for_task(&user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    request_body = TaskForm,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 409, description = "A task with this title exists", body = ErrorBody),
        (status = 422, description = "Invalid form or unknown subject", body = ErrorBody)
    )
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(form): ApiJson<TaskForm>,
) -> Result<impl IntoResponse, ApiError> {
    form.validate()?;
    let task = state
        .planner
        .create_task(&user, form.into_new_task(user.id))
        .await?;
    info!("User {} created task {}", user.id, task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

/// Saves the edit modal: every field of the form replaces the stored one.
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    request_body = TaskForm,
    responses(
        (status = 200, description = "Task replaced", body = Task),
        (status = 404, description = "No such task", body = ErrorBody),
        (status = 422, description = "Invalid form or unknown subject", body = ErrorBody)
    )
)]
pub async fn replace_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(form): ApiJson<TaskForm>,
) -> Result<Json<Task>, ApiError> {
    form.validate()?;
    Ok(Json(state.planner.update_task(&user, id, form.into_patch()).await?))
}

/// Partial update, e.g. ticking the completed box.
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    request_body = TaskPatch,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 404, description = "No such task", body = ErrorBody),
        (status = 422, description = "Invalid field or unknown subject", body = ErrorBody)
    )
)]
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    if matches!(&patch.title, Some(title) if title.is_empty()) {
        return Err(PortError::Invalid("Title is required".to_string()).into());
    }
    if matches!(patch.estimated_time, Some(Some(minutes)) if minutes < 0) {
        return Err(PortError::Invalid("Estimated time cannot be negative".to_string()).into());
    }
    Ok(Json(state.planner.update_task(&user, id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "No such task", body = ErrorBody)
    )
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.planner.delete_task(&user, id).await?;
    info!("User {} deleted task {}", user.id, id);
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Study Sessions
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/study-sessions",
    tag = "study-sessions",
    responses((status = 200, description = "All study sessions of the current user", body = [StudySession]))
)]
pub async fn list_study_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<StudySession>>, ApiError> {
    Ok(Json(state.planner.study_sessions(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/study-sessions/{id}",
    tag = "study-sessions",
    params(("id" = i64, Path, description = "Study session id")),
    responses(
        (status = 200, description = "The study session", body = StudySession),
        (status = 404, description = "No such study session", body = ErrorBody)
    )
)]
pub async fn get_study_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<StudySession>, ApiError> {
    Ok(Json(state.planner.study_session(&user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/study-sessions",
    tag = "study-sessions",
    request_body = NewStudySession,
    responses(
        (status = 201, description = "Study session created", body = StudySession),
        (status = 409, description = "Same title already booked at that date and time", body = ErrorBody),
        (status = 422, description = "End before start or unknown subject", body = ErrorBody)
    )
)]
pub async fn create_study_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(new_session): ApiJson<NewStudySession>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.planner.create_study_session(&user, new_session).await?;
    info!("User {} created study session {}", user.id, session.id);
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    patch,
    path = "/api/study-sessions/{id}",
    tag = "study-sessions",
    params(("id" = i64, Path, description = "Study session id")),
    request_body = StudySessionPatch,
    responses(
        (status = 200, description = "Study session updated", body = StudySession),
        (status = 404, description = "No such study session", body = ErrorBody),
        (status = 422, description = "End before start or unknown subject", body = ErrorBody)
    )
)]
pub async fn update_study_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<StudySessionPatch>,
) -> Result<Json<StudySession>, ApiError> {
    Ok(Json(state.planner.update_study_session(&user, id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/study-sessions/{id}",
    tag = "study-sessions",
    params(("id" = i64, Path, description = "Study session id")),
    responses(
        (status = 204, description = "Study session deleted"),
        (status = 404, description = "No such study session", body = ErrorBody)
    )
)]
pub async fn delete_study_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.planner.delete_study_session(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Study Time Records
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/study-time-records",
    tag = "study-time-records",
    responses((status = 200, description = "All study-time records of the current user", body = [StudyTimeRecord]))
)]
pub async fn list_study_time_records_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<StudyTimeRecord>>, ApiError> {
    Ok(Json(state.planner.study_time_records(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/study-time-records/{id}",
    tag = "study-time-records",
    params(("id" = i64, Path, description = "Study-time record id")),
    responses(
        (status = 200, description = "The record", body = StudyTimeRecord),
        (status = 404, description = "No such record", body = ErrorBody)
    )
)]
pub async fn get_study_time_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<StudyTimeRecord>, ApiError> {
    Ok(Json(state.planner.study_time_record(&user, id).await?))
}

/// Logs study time, e.g. a finished pomodoro focus block.
#[utoipa::path(
    post,
    path = "/api/study-time-records",
    tag = "study-time-records",
    request_body = NewStudyTimeRecord,
    responses(
        (status = 201, description = "Record created", body = StudyTimeRecord),
        (status = 409, description = "A record for this day, subject and task exists", body = ErrorBody),
        (status = 422, description = "Non-positive duration or unknown subject/task", body = ErrorBody)
    )
)]
pub async fn create_study_time_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(new_record): ApiJson<NewStudyTimeRecord>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .planner
        .create_study_time_record(&user, new_record)
        .await?;
    info!(
        "User {} logged {} minutes on subject {}",
        user.id, record.duration, record.subject_id
    );
    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    patch,
    path = "/api/study-time-records/{id}",
    tag = "study-time-records",
    params(("id" = i64, Path, description = "Study-time record id")),
    request_body = StudyTimeRecordPatch,
    responses(
        (status = 200, description = "Record updated", body = StudyTimeRecord),
        (status = 404, description = "No such record", body = ErrorBody),
        (status = 422, description = "Non-positive duration or unknown subject/task", body = ErrorBody)
    )
)]
pub async fn update_study_time_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<StudyTimeRecordPatch>,
) -> Result<Json<StudyTimeRecord>, ApiError> {
    Ok(Json(state.planner.update_study_time_record(&user, id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/study-time-records/{id}",
    tag = "study-time-records",
    params(("id" = i64, Path, description = "Study-time record id")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "No such record", body = ErrorBody)
    )
)]
pub async fn delete_study_time_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.planner.delete_study_time_record(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
