//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Natural keys and delete cascades live in the schema (see `migrations/`), so the
//! insert-if-absent calls are a single `INSERT ... ON CONFLICT DO NOTHING`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use study_planner_core::domain::{
    NewStudySession, NewStudyTimeRecord, NewSubject, NewTask, NewUser, Priority, StudySession,
    StudySessionPatch, StudyTimeRecord, StudyTimeRecordPatch, Subject, SubjectPatch, Task,
    TaskPatch, Upsert, User, UserCredentials, UserPatch, UserSettings,
};
use study_planner_core::ports::{DatabaseService, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> PortResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

/// Maps a sqlx error onto the port's vocabulary.
fn port_error(e: sqlx::Error, what: &str) -> PortError {
    match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", what))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::Invalid(format!("{} references a missing row", what))
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn deleted(rows_affected: u64, what: &str, id: i64) -> PortResult<()> {
    if rows_affected == 0 {
        Err(PortError::NotFound(format!("{} {} not found", what, id)))
    } else {
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, username, email, first_name, last_name";

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: i64,
    username: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct SettingsRecord {
    dark_mode: bool,
    notifications: bool,
    show_completed: bool,
    auto_break: bool,
    focus_duration: i32,
    short_break_duration: i32,
    long_break_duration: i32,
    sessions_before_long_break: i32,
}
impl SettingsRecord {
    fn to_domain(self) -> UserSettings {
        UserSettings {
            dark_mode: self.dark_mode,
            notifications: self.notifications,
            show_completed: self.show_completed,
            auto_break: self.auto_break,
            focus_duration: self.focus_duration,
            short_break_duration: self.short_break_duration,
            long_break_duration: self.long_break_duration,
            sessions_before_long_break: self.sessions_before_long_break,
        }
    }
}

const SUBJECT_COLUMNS: &str = "id, user_id, name, color, description";

#[derive(FromRow)]
struct SubjectRecord {
    id: i64,
    user_id: i64,
    name: String,
    color: String,
    description: Option<String>,
}
impl SubjectRecord {
    fn to_domain(self) -> Subject {
        Subject {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            color: self.color,
            description: self.description,
        }
    }
}

const TASK_COLUMNS: &str =
    "id, user_id, subject_id, title, description, priority, due_date, estimated_time, completed";

#[derive(FromRow)]
struct TaskRecord {
    id: i64,
    user_id: i64,
    subject_id: Option<i64>,
    title: String,
    description: Option<String>,
    priority: String,
    due_date: Option<NaiveDate>,
    estimated_time: Option<i32>,
    completed: bool,
}
impl TaskRecord {
    fn to_domain(self) -> PortResult<Task> {
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Task {
            id: self.id,
            user_id: self.user_id,
            subject_id: self.subject_id,
            title: self.title,
            description: self.description,
            priority,
            due_date: self.due_date,
            estimated_time: self.estimated_time,
            completed: self.completed,
        })
    }
}

const SESSION_COLUMNS: &str = "id, user_id, subject_id, title, date, start_time, end_time, \
                               description, completed, location, participants";

#[derive(FromRow)]
struct StudySessionRecord {
    id: i64,
    user_id: i64,
    subject_id: Option<i64>,
    title: String,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    description: Option<String>,
    completed: bool,
    location: Option<String>,
    participants: i32,
}
impl StudySessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            user_id: self.user_id,
            subject_id: self.subject_id,
            title: self.title,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            description: self.description,
            completed: self.completed,
            location: self.location,
            participants: self.participants,
        }
    }
}

const RECORD_COLUMNS: &str = "id, user_id, subject_id, task_id, date, duration, focus_score";

#[derive(FromRow)]
struct StudyTimeRecordRow {
    id: i64,
    user_id: i64,
    subject_id: i64,
    task_id: Option<i64>,
    date: NaiveDate,
    duration: i32,
    focus_score: Option<i32>,
}
impl StudyTimeRecordRow {
    fn to_domain(self) -> StudyTimeRecord {
        StudyTimeRecord {
            id: self.id,
            user_id: self.user_id,
            subject_id: self.subject_id,
            task_id: self.task_id,
            date: self.date,
            duration: self.duration,
            focus_score: self.focus_score,
        }
    }
}

//=========================================================================================
// Insert Statements
//=========================================================================================
// Each entity has one INSERT; the `if_absent` variants append ON CONFLICT DO NOTHING
// and fall back to selecting the row that already holds the natural key.

fn subject_insert(on_conflict: &str) -> String {
    format!(
        "INSERT INTO subjects (user_id, name, color, description) VALUES ($1, $2, $3, $4) {} RETURNING {}",
        on_conflict, SUBJECT_COLUMNS
    )
}

fn task_insert(on_conflict: &str) -> String {
    format!(
        "INSERT INTO tasks (user_id, subject_id, title, description, priority, due_date, estimated_time, completed) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) {} RETURNING {}",
        on_conflict, TASK_COLUMNS
    )
}

fn session_insert(on_conflict: &str) -> String {
    format!(
        "INSERT INTO study_sessions (user_id, subject_id, title, date, start_time, end_time, description, completed, location, participants) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) {} RETURNING {}",
        on_conflict, SESSION_COLUMNS
    )
}

fn record_insert(on_conflict: &str) -> String {
    format!(
        "INSERT INTO study_time_records (user_id, subject_id, task_id, date, duration, focus_score) \
         VALUES ($1, $2, $3, $4, $5, $6) {} RETURNING {}",
        on_conflict, RECORD_COLUMNS
    )
}

const DO_NOTHING: &str = "ON CONFLICT DO NOTHING";

impl DbAdapter {
    async fn insert_subject(&self, new: &NewSubject, on_conflict: &str) -> PortResult<Option<Subject>> {
        let record = sqlx::query_as::<_, SubjectRecord>(&subject_insert(on_conflict))
            .bind(new.user_id)
            .bind(&new.name)
            .bind(&new.color)
            .bind(&new.description)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| port_error(e, "Subject"))?;
        Ok(record.map(SubjectRecord::to_domain))
    }

    async fn insert_task(&self, new: &NewTask, on_conflict: &str) -> PortResult<Option<Task>> {
        let record = sqlx::query_as::<_, TaskRecord>(&task_insert(on_conflict))
            .bind(new.user_id)
            .bind(new.subject_id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.priority.as_str())
            .bind(new.due_date)
            .bind(new.estimated_time)
            .bind(new.completed)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| port_error(e, "Task"))?;
        record.map(TaskRecord::to_domain).transpose()
    }

    async fn insert_session(
        &self,
        new: &NewStudySession,
        on_conflict: &str,
    ) -> PortResult<Option<StudySession>> {
        let record = sqlx::query_as::<_, StudySessionRecord>(&session_insert(on_conflict))
            .bind(new.user_id)
            .bind(new.subject_id)
            .bind(&new.title)
            .bind(new.date)
            .bind(new.start_time)
            .bind(new.end_time)
            .bind(&new.description)
            .bind(new.completed)
            .bind(&new.location)
            .bind(new.participants)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| port_error(e, "Study session"))?;
        Ok(record.map(StudySessionRecord::to_domain))
    }

    async fn insert_record(
        &self,
        new: &NewStudyTimeRecord,
        on_conflict: &str,
    ) -> PortResult<Option<StudyTimeRecord>> {
        let record = sqlx::query_as::<_, StudyTimeRecordRow>(&record_insert(on_conflict))
            .bind(new.user_id)
            .bind(new.subject_id)
            .bind(new.task_id)
            .bind(new.date)
            .bind(new.duration)
            .bind(new.focus_score)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| port_error(e, "Study time record"))?;
        Ok(record.map(StudyTimeRecordRow::to_domain))
    }
}

fn inserted<T>(row: Option<T>, what: &str) -> PortResult<T> {
    row.ok_or_else(|| PortError::Unexpected(format!("{} insert returned no row", what)))
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- User Management ---

    async fn get_user(&self, user_id: i64) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, &format!("User {}", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, username, hashed_password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, &format!("User {}", username)))?;
        Ok(UserCredentials {
            user_id: record.id,
            username: record.username,
            hashed_password: record.hashed_password,
        })
    }

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (username, email, first_name, last_name, hashed_password) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, "Username"))?;
        Ok(record.to_domain())
    }

    async fn update_user(&self, user_id: i64, patch: UserPatch) -> PortResult<User> {
        let mut tx = self.begin().await?;
        let mut user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1 FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| port_error(e, &format!("User {}", user_id)))?
        .to_domain();
        user.apply(patch);

        sqlx::query(
            "UPDATE users SET username = $1, email = $2, first_name = $3, last_name = $4 WHERE id = $5",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| port_error(e, "Username"))?;
        tx.commit().await.map_err(|e| port_error(e, "User"))?;
        Ok(user)
    }

    async fn ensure_user(&self, new_user: NewUser) -> PortResult<Upsert<User>> {
        let created = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (username, email, first_name, last_name, hashed_password) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT (username) DO NOTHING RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.hashed_password)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| port_error(e, "User"))?;

        if let Some(record) = created {
            return Ok(Upsert {
                row: record.to_domain(),
                inserted: true,
            });
        }
        let existing = self.get_user_by_username(&new_user.username).await?;
        Ok(Upsert {
            row: self.get_user(existing.user_id).await?,
            inserted: false,
        })
    }

    // --- Auth Methods ---

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| port_error(e, "Auth session"))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<i64> {
        let user_id = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    // --- Settings ---

    async fn get_settings(&self, user_id: i64) -> PortResult<UserSettings> {
        let record = sqlx::query_as::<_, SettingsRecord>(
            "SELECT dark_mode, notifications, show_completed, auto_break, focus_duration, \
             short_break_duration, long_break_duration, sessions_before_long_break \
             FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        match record {
            Some(record) => Ok(record.to_domain()),
            None => {
                // Surfaces NotFound for unknown users rather than handing out defaults.
                self.get_user(user_id).await?;
                Ok(UserSettings::default())
            }
        }
    }

    async fn save_settings(&self, user_id: i64, settings: UserSettings) -> PortResult<UserSettings> {
        sqlx::query(
            "INSERT INTO user_settings (user_id, dark_mode, notifications, show_completed, auto_break, \
             focus_duration, short_break_duration, long_break_duration, sessions_before_long_break) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (user_id) DO UPDATE SET dark_mode = EXCLUDED.dark_mode, \
             notifications = EXCLUDED.notifications, show_completed = EXCLUDED.show_completed, \
             auto_break = EXCLUDED.auto_break, focus_duration = EXCLUDED.focus_duration, \
             short_break_duration = EXCLUDED.short_break_duration, \
             long_break_duration = EXCLUDED.long_break_duration, \
             sessions_before_long_break = EXCLUDED.sessions_before_long_break",
        )
        .bind(user_id)
        .bind(settings.dark_mode)
        .bind(settings.notifications)
        .bind(settings.show_completed)
        .bind(settings.auto_break)
        .bind(settings.focus_duration)
        .bind(settings.short_break_duration)
        .bind(settings.long_break_duration)
        .bind(settings.sessions_before_long_break)
        .execute(&self.pool)
        .await
        .map_err(|e| port_error(e, &format!("User {}", user_id)))?;
        Ok(settings)
    }

    // --- Subjects ---

    async fn list_subjects(&self, user_id: i64) -> PortResult<Vec<Subject>> {
        let records = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {} FROM subjects WHERE user_id = $1 ORDER BY id ASC",
            SUBJECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_subject(&self, subject_id: i64) -> PortResult<Subject> {
        let record = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {} FROM subjects WHERE id = $1",
            SUBJECT_COLUMNS
        ))
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, &format!("Subject {}", subject_id)))?;
        Ok(record.to_domain())
    }

    async fn create_subject(&self, new_subject: NewSubject) -> PortResult<Subject> {
        let row = self.insert_subject(&new_subject, "").await?;
        inserted(row, "Subject")
    }

    async fn update_subject(&self, subject_id: i64, patch: SubjectPatch) -> PortResult<Subject> {
        let mut tx = self.begin().await?;
        let mut subject = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {} FROM subjects WHERE id = $1 FOR UPDATE",
            SUBJECT_COLUMNS
        ))
        .bind(subject_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| port_error(e, &format!("Subject {}", subject_id)))?
        .to_domain();
        subject.apply(patch);

        sqlx::query("UPDATE subjects SET name = $1, color = $2, description = $3 WHERE id = $4")
            .bind(&subject.name)
            .bind(&subject.color)
            .bind(&subject.description)
            .bind(subject_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| port_error(e, "Subject"))?;
        tx.commit().await.map_err(|e| port_error(e, "Subject"))?;
        Ok(subject)
    }

    async fn delete_subject(&self, subject_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(|e| port_error(e, "Subject"))?;
        deleted(result.rows_affected(), "Subject", subject_id)
    }

    async fn insert_subject_if_absent(&self, new_subject: NewSubject) -> PortResult<Upsert<Subject>> {
        if let Some(row) = self.insert_subject(&new_subject, DO_NOTHING).await? {
            return Ok(Upsert { row, inserted: true });
        }
        let record = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {} FROM subjects WHERE user_id = $1 AND name = $2",
            SUBJECT_COLUMNS
        ))
        .bind(new_subject.user_id)
        .bind(&new_subject.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, "Subject"))?;
        Ok(Upsert {
            row: record.to_domain(),
            inserted: false,
        })
    }

    // --- Tasks ---

    async fn list_tasks(&self, user_id: i64) -> PortResult<Vec<Task>> {
        let records = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY id ASC",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_task(&self, task_id: i64) -> PortResult<Task> {
        sqlx::query_as::<_, TaskRecord>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(task_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| port_error(e, &format!("Task {}", task_id)))?
            .to_domain()
    }

    async fn create_task(&self, new_task: NewTask) -> PortResult<Task> {
        let row = self.insert_task(&new_task, "").await?;
        inserted(row, "Task")
    }

    async fn update_task(&self, task_id: i64, patch: TaskPatch) -> PortResult<Task> {
        let mut tx = self.begin().await?;
        let mut task = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 FOR UPDATE",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| port_error(e, &format!("Task {}", task_id)))?
        .to_domain()?;
        task.apply(patch);

        sqlx::query(
            "UPDATE tasks SET subject_id = $1, title = $2, description = $3, priority = $4, \
             due_date = $5, estimated_time = $6, completed = $7 WHERE id = $8",
        )
        .bind(task.subject_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.estimated_time)
        .bind(task.completed)
        .bind(task_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| port_error(e, "Task"))?;
        tx.commit().await.map_err(|e| port_error(e, "Task"))?;
        Ok(task)
    }

    async fn delete_task(&self, task_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| port_error(e, "Task"))?;
        deleted(result.rows_affected(), "Task", task_id)
    }

    async fn insert_task_if_absent(&self, new_task: NewTask) -> PortResult<Upsert<Task>> {
        if let Some(row) = self.insert_task(&new_task, DO_NOTHING).await? {
            return Ok(Upsert { row, inserted: true });
        }
        let row = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM tasks WHERE user_id = $1 AND title = $2",
            TASK_COLUMNS
        ))
        .bind(new_task.user_id)
        .bind(&new_task.title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, "Task"))?
        .to_domain()?;
        Ok(Upsert { row, inserted: false })
    }

    // --- Study Sessions ---

    async fn list_study_sessions(&self, user_id: i64) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE user_id = $1 ORDER BY id ASC",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_study_session(&self, session_id: i64) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, &format!("Study session {}", session_id)))?;
        Ok(record.to_domain())
    }

    async fn create_study_session(&self, new_session: NewStudySession) -> PortResult<StudySession> {
        let row = self.insert_session(&new_session, "").await?;
        inserted(row, "Study session")
    }

    async fn update_study_session(
        &self,
        session_id: i64,
        patch: StudySessionPatch,
    ) -> PortResult<StudySession> {
        let mut tx = self.begin().await?;
        let mut session = sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE id = $1 FOR UPDATE",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| port_error(e, &format!("Study session {}", session_id)))?
        .to_domain();
        session.apply(patch);

        sqlx::query(
            "UPDATE study_sessions SET subject_id = $1, title = $2, date = $3, start_time = $4, \
             end_time = $5, description = $6, completed = $7, location = $8, participants = $9 \
             WHERE id = $10",
        )
        .bind(session.subject_id)
        .bind(&session.title)
        .bind(session.date)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(&session.description)
        .bind(session.completed)
        .bind(&session.location)
        .bind(session.participants)
        .bind(session_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| port_error(e, "Study session"))?;
        tx.commit().await.map_err(|e| port_error(e, "Study session"))?;
        Ok(session)
    }

    async fn delete_study_session(&self, session_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM study_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| port_error(e, "Study session"))?;
        deleted(result.rows_affected(), "Study session", session_id)
    }

    async fn insert_study_session_if_absent(
        &self,
        new_session: NewStudySession,
    ) -> PortResult<Upsert<StudySession>> {
        if let Some(row) = self.insert_session(&new_session, DO_NOTHING).await? {
            return Ok(Upsert { row, inserted: true });
        }
        let record = sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE user_id = $1 AND title = $2 AND date = $3 AND start_time = $4",
            SESSION_COLUMNS
        ))
        .bind(new_session.user_id)
        .bind(&new_session.title)
        .bind(new_session.date)
        .bind(new_session.start_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, "Study session"))?;
        Ok(Upsert {
            row: record.to_domain(),
            inserted: false,
        })
    }

    // --- Study Time Records ---

    async fn list_study_time_records(&self, user_id: i64) -> PortResult<Vec<StudyTimeRecord>> {
        let records = sqlx::query_as::<_, StudyTimeRecordRow>(&format!(
            "SELECT {} FROM study_time_records WHERE user_id = $1 ORDER BY id ASC",
            RECORD_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_study_time_record(&self, record_id: i64) -> PortResult<StudyTimeRecord> {
        let record = sqlx::query_as::<_, StudyTimeRecordRow>(&format!(
            "SELECT {} FROM study_time_records WHERE id = $1",
            RECORD_COLUMNS
        ))
        .bind(record_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, &format!("Study time record {}", record_id)))?;
        Ok(record.to_domain())
    }

    async fn create_study_time_record(
        &self,
        new_record: NewStudyTimeRecord,
    ) -> PortResult<StudyTimeRecord> {
        let row = self.insert_record(&new_record, "").await?;
        inserted(row, "Study time record")
    }

    async fn update_study_time_record(
        &self,
        record_id: i64,
        patch: StudyTimeRecordPatch,
    ) -> PortResult<StudyTimeRecord> {
        let mut tx = self.begin().await?;
        let mut record = sqlx::query_as::<_, StudyTimeRecordRow>(&format!(
            "SELECT {} FROM study_time_records WHERE id = $1 FOR UPDATE",
            RECORD_COLUMNS
        ))
        .bind(record_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| port_error(e, &format!("Study time record {}", record_id)))?
        .to_domain();
        record.apply(patch);

        sqlx::query(
            "UPDATE study_time_records SET subject_id = $1, task_id = $2, date = $3, duration = $4, \
             focus_score = $5 WHERE id = $6",
        )
        .bind(record.subject_id)
        .bind(record.task_id)
        .bind(record.date)
        .bind(record.duration)
        .bind(record.focus_score)
        .bind(record_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| port_error(e, "Study time record"))?;
        tx.commit().await.map_err(|e| port_error(e, "Study time record"))?;
        Ok(record)
    }

    async fn delete_study_time_record(&self, record_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM study_time_records WHERE id = $1")
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(|e| port_error(e, "Study time record"))?;
        deleted(result.rows_affected(), "Study time record", record_id)
    }

    async fn insert_study_time_record_if_absent(
        &self,
        new_record: NewStudyTimeRecord,
    ) -> PortResult<Upsert<StudyTimeRecord>> {
        if let Some(row) = self.insert_record(&new_record, DO_NOTHING).await? {
            return Ok(Upsert { row, inserted: true });
        }
        let record = sqlx::query_as::<_, StudyTimeRecordRow>(&format!(
            "SELECT {} FROM study_time_records \
             WHERE user_id = $1 AND date = $2 AND subject_id = $3 AND task_id IS NOT DISTINCT FROM $4",
            RECORD_COLUMNS
        ))
        .bind(new_record.user_id)
        .bind(new_record.date)
        .bind(new_record.subject_id)
        .bind(new_record.task_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| port_error(e, "Study time record"))?;
        Ok(Upsert {
            row: record.to_domain(),
            inserted: false,
        })
    }
}
