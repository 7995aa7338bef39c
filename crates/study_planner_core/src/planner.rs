//! crates/study_planner_core/src/planner.rs
//!
//! Ownership-aware CRUD on top of the storage port. Handlers go through the
//! `Planner` rather than the raw `DatabaseService` so that no request can read or
//! touch another user's rows, and no row can reference another user's subject or task.

use std::sync::Arc;

use crate::domain::{
    CurrentUser, NewStudySession, NewStudyTimeRecord, NewSubject, NewTask, StudySession,
    StudySessionPatch, StudyTimeRecord, StudyTimeRecordPatch, Subject, SubjectPatch, Task,
    TaskPatch,
};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Clone)]
pub struct Planner {
    db: Arc<dyn DatabaseService>,
}

/// Rows that belong to exactly one user.
trait Owned {
    fn owner(&self) -> i64;
}

impl Owned for Subject {
    fn owner(&self) -> i64 {
        self.user_id
    }
}

impl Owned for Task {
    fn owner(&self) -> i64 {
        self.user_id
    }
}

impl Owned for StudySession {
    fn owner(&self) -> i64 {
        self.user_id
    }
}

impl Owned for StudyTimeRecord {
    fn owner(&self) -> i64 {
        self.user_id
    }
}

/// Hides rows of other users behind the same `NotFound` an absent id produces.
fn owned_by<T: Owned>(row: T, user: &CurrentUser, what: &str, id: i64) -> PortResult<T> {
    if row.owner() == user.id {
        Ok(row)
    } else {
        Err(PortError::NotFound(format!("{} {} not found", what, id)))
    }
}

impl Planner {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Arc<dyn DatabaseService> {
        &self.db
    }

    //-------------------------------------------------------------------------------------
    // Reference checks
    //-------------------------------------------------------------------------------------

    async fn check_subject_ref(&self, user: &CurrentUser, subject_id: Option<i64>) -> PortResult<()> {
        let Some(subject_id) = subject_id else {
            return Ok(());
        };
        match self.db.get_subject(subject_id).await {
            Ok(subject) if subject.user_id == user.id => Ok(()),
            Ok(_) | Err(PortError::NotFound(_)) => Err(PortError::Invalid(format!(
                "subject {} does not exist",
                subject_id
            ))),
            Err(e) => Err(e),
        }
    }

    async fn check_task_ref(&self, user: &CurrentUser, task_id: Option<i64>) -> PortResult<()> {
        let Some(task_id) = task_id else {
            return Ok(());
        };
        match self.db.get_task(task_id).await {
            Ok(task) if task.user_id == user.id => Ok(()),
            Ok(_) | Err(PortError::NotFound(_)) => Err(PortError::Invalid(format!(
                "task {} does not exist",
                task_id
            ))),
            Err(e) => Err(e),
        }
    }

    //-------------------------------------------------------------------------------------
    // Subjects
    //-------------------------------------------------------------------------------------

    pub async fn subjects(&self, user: &CurrentUser) -> PortResult<Vec<Subject>> {
        self.db.list_subjects(user.id).await
    }

    pub async fn subject(&self, user: &CurrentUser, id: i64) -> PortResult<Subject> {
        owned_by(self.db.get_subject(id).await?, user, "Subject", id)
    }

    pub async fn create_subject(&self, user: &CurrentUser, mut new: NewSubject) -> PortResult<Subject> {
        new.user_id = user.id;
        self.db.create_subject(new).await
    }

    pub async fn update_subject(
        &self,
        user: &CurrentUser,
        id: i64,
        patch: SubjectPatch,
    ) -> PortResult<Subject> {
        self.subject(user, id).await?;
        self.db.update_subject(id, patch).await
    }

    pub async fn delete_subject(&self, user: &CurrentUser, id: i64) -> PortResult<()> {
        self.subject(user, id).await?;
        self.db.delete_subject(id).await
    }

    //-------------------------------------------------------------------------------------
    // Tasks
    //-------------------------------------------------------------------------------------

    pub async fn tasks(&self, user: &CurrentUser) -> PortResult<Vec<Task>> {
        self.db.list_tasks(user.id).await
    }

    pub async fn task(&self, user: &CurrentUser, id: i64) -> PortResult<Task> {
        owned_by(self.db.get_task(id).await?, user, "Task", id)
    }

    pub async fn create_task(&self, user: &CurrentUser, mut new: NewTask) -> PortResult<Task> {
        new.user_id = user.id;
        self.check_subject_ref(user, new.subject_id).await?;
        self.db.create_task(new).await
    }

    pub async fn update_task(&self, user: &CurrentUser, id: i64, patch: TaskPatch) -> PortResult<Task> {
        self.task(user, id).await?;
        if let Some(subject_id) = patch.subject_id {
            self.check_subject_ref(user, subject_id).await?;
        }
        self.db.update_task(id, patch).await
    }

    pub async fn delete_task(&self, user: &CurrentUser, id: i64) -> PortResult<()> {
        self.task(user, id).await?;
        self.db.delete_task(id).await
    }

    /// The subject a task is filed under; `None` for a task without one.
    pub async fn subject_for_task(&self, user: &CurrentUser, task_id: i64) -> PortResult<Option<Subject>> {
        let task = self.task(user, task_id).await?;
        let Some(subject_id) = task.subject_id else {
            return Ok(None);
        };
        match self.db.get_subject(subject_id).await {
            Ok(subject) if subject.user_id == user.id => Ok(Some(subject)),
            Ok(_) | Err(PortError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    //-------------------------------------------------------------------------------------
    // Study Sessions
    //-------------------------------------------------------------------------------------

    pub async fn study_sessions(&self, user: &CurrentUser) -> PortResult<Vec<StudySession>> {
        self.db.list_study_sessions(user.id).await
    }

    pub async fn study_session(&self, user: &CurrentUser, id: i64) -> PortResult<StudySession> {
        owned_by(self.db.get_study_session(id).await?, user, "Study session", id)
    }

    pub async fn create_study_session(
        &self,
        user: &CurrentUser,
        mut new: NewStudySession,
    ) -> PortResult<StudySession> {
        new.user_id = user.id;
        if new.end_time < new.start_time {
            return Err(PortError::Invalid("endTime must not be before startTime".to_string()));
        }
        self.check_subject_ref(user, new.subject_id).await?;
        self.db.create_study_session(new).await
    }

    pub async fn update_study_session(
        &self,
        user: &CurrentUser,
        id: i64,
        patch: StudySessionPatch,
    ) -> PortResult<StudySession> {
        let existing = self.study_session(user, id).await?;
        let start = patch.start_time.unwrap_or(existing.start_time);
        let end = patch.end_time.unwrap_or(existing.end_time);
        if end < start {
            return Err(PortError::Invalid("endTime must not be before startTime".to_string()));
        }
        if let Some(subject_id) = patch.subject_id {
            self.check_subject_ref(user, subject_id).await?;
        }
        self.db.update_study_session(id, patch).await
    }

    pub async fn delete_study_session(&self, user: &CurrentUser, id: i64) -> PortResult<()> {
        self.study_session(user, id).await?;
        self.db.delete_study_session(id).await
    }

    //-------------------------------------------------------------------------------------
    // Study Time Records
    //-------------------------------------------------------------------------------------

    pub async fn study_time_records(&self, user: &CurrentUser) -> PortResult<Vec<StudyTimeRecord>> {
        self.db.list_study_time_records(user.id).await
    }

    pub async fn study_time_record(&self, user: &CurrentUser, id: i64) -> PortResult<StudyTimeRecord> {
        owned_by(self.db.get_study_time_record(id).await?, user, "Study time record", id)
    }

    pub async fn create_study_time_record(
        &self,
        user: &CurrentUser,
        mut new: NewStudyTimeRecord,
    ) -> PortResult<StudyTimeRecord> {
        new.user_id = user.id;
        if new.duration <= 0 {
            return Err(PortError::Invalid("duration must be positive".to_string()));
        }
        self.check_subject_ref(user, Some(new.subject_id)).await?;
        self.check_task_ref(user, new.task_id).await?;
        self.db.create_study_time_record(new).await
    }

    pub async fn update_study_time_record(
        &self,
        user: &CurrentUser,
        id: i64,
        patch: StudyTimeRecordPatch,
    ) -> PortResult<StudyTimeRecord> {
        self.study_time_record(user, id).await?;
        if matches!(patch.duration, Some(d) if d <= 0) {
            return Err(PortError::Invalid("duration must be positive".to_string()));
        }
        self.check_subject_ref(user, patch.subject_id).await?;
        if let Some(task_id) = patch.task_id {
            self.check_task_ref(user, task_id).await?;
        }
        self.db.update_study_time_record(id, patch).await
    }

    pub async fn delete_study_time_record(&self, user: &CurrentUser, id: i64) -> PortResult<()> {
        self.study_time_record(user, id).await?;
        self.db.delete_study_time_record(id).await
    }
}
