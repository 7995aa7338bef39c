//! crates/study_planner_core/src/ports.rs
//!
//! Defines the storage contract for the application's core logic.
//! The trait forms the boundary of the hexagonal architecture: the planner and the
//! seeder only ever talk to `DatabaseService`, never to a concrete store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    NewStudySession, NewStudyTimeRecord, NewSubject, NewTask, NewUser, StudySession,
    StudySessionPatch, StudyTimeRecord, StudyTimeRecordPatch, Subject, SubjectPatch, Task,
    TaskPatch, Upsert, User, UserCredentials, UserPatch, UserSettings,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the backing store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A unique natural key (subject name, task title, ...) is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A request referenced rows it may not use, e.g. another user's subject.
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Port
//=========================================================================================

/// CRUD over every entity of the planner.
///
/// Contract shared by all adapters:
/// - `list_*` return rows of one user ordered by id, empty when there are none.
/// - `get_*`, `update_*` and `delete_*` fail with `NotFound` for an absent id.
/// - `create_*` fails with `Conflict` when the row's natural key already exists.
/// - `insert_*_if_absent` is the atomic form of "check natural key, then insert";
///   concurrent callers observe exactly one insert.
/// - deleting a subject nulls `subject_id` on its tasks and sessions and removes
///   its study-time records; deleting a task nulls `task_id` on its records.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn get_user(&self, user_id: i64) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn update_user(&self, user_id: i64, patch: UserPatch) -> PortResult<User>;

    /// Returns the user with `new_user.username`, creating it first if needed.
    async fn ensure_user(&self, new_user: NewUser) -> PortResult<Upsert<User>>;

    // --- Auth Methods ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live session to its user; missing or expired sessions are `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<i64>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Settings ---
    /// Returns the saved settings, or the defaults if the user never saved any.
    async fn get_settings(&self, user_id: i64) -> PortResult<UserSettings>;

    async fn save_settings(&self, user_id: i64, settings: UserSettings) -> PortResult<UserSettings>;

    // --- Subjects ---
    async fn list_subjects(&self, user_id: i64) -> PortResult<Vec<Subject>>;

    async fn get_subject(&self, subject_id: i64) -> PortResult<Subject>;

    async fn create_subject(&self, new_subject: NewSubject) -> PortResult<Subject>;

    async fn update_subject(&self, subject_id: i64, patch: SubjectPatch) -> PortResult<Subject>;

    async fn delete_subject(&self, subject_id: i64) -> PortResult<()>;

    async fn insert_subject_if_absent(&self, new_subject: NewSubject) -> PortResult<Upsert<Subject>>;

    // --- Tasks ---
    async fn list_tasks(&self, user_id: i64) -> PortResult<Vec<Task>>;

    async fn get_task(&self, task_id: i64) -> PortResult<Task>;

    async fn create_task(&self, new_task: NewTask) -> PortResult<Task>;

    async fn update_task(&self, task_id: i64, patch: TaskPatch) -> PortResult<Task>;

    async fn delete_task(&self, task_id: i64) -> PortResult<()>;

    async fn insert_task_if_absent(&self, new_task: NewTask) -> PortResult<Upsert<Task>>;

    // --- Study Sessions ---
    async fn list_study_sessions(&self, user_id: i64) -> PortResult<Vec<StudySession>>;

    async fn get_study_session(&self, session_id: i64) -> PortResult<StudySession>;

    async fn create_study_session(&self, new_session: NewStudySession) -> PortResult<StudySession>;

    async fn update_study_session(
        &self,
        session_id: i64,
        patch: StudySessionPatch,
    ) -> PortResult<StudySession>;

    async fn delete_study_session(&self, session_id: i64) -> PortResult<()>;

    async fn insert_study_session_if_absent(
        &self,
        new_session: NewStudySession,
    ) -> PortResult<Upsert<StudySession>>;

    // --- Study Time Records ---
    async fn list_study_time_records(&self, user_id: i64) -> PortResult<Vec<StudyTimeRecord>>;

    async fn get_study_time_record(&self, record_id: i64) -> PortResult<StudyTimeRecord>;

    async fn create_study_time_record(
        &self,
        new_record: NewStudyTimeRecord,
    ) -> PortResult<StudyTimeRecord>;

    async fn update_study_time_record(
        &self,
        record_id: i64,
        patch: StudyTimeRecordPatch,
    ) -> PortResult<StudyTimeRecord>;

    async fn delete_study_time_record(&self, record_id: i64) -> PortResult<()>;

    async fn insert_study_time_record_if_absent(
        &self,
        new_record: NewStudyTimeRecord,
    ) -> PortResult<Upsert<StudyTimeRecord>>;
}
