//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. All tables sit
//! behind one `RwLock`, so every call, including the insert-if-absent ones, is
//! atomic with respect to every other call. Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeMap, HashMap};
use study_planner_core::domain::{
    NewStudySession, NewStudyTimeRecord, NewSubject, NewTask, NewUser, StudySession,
    StudySessionPatch, StudyTimeRecord, StudyTimeRecordPatch, Subject, SubjectPatch, Task,
    TaskPatch, Upsert, User, UserCredentials, UserPatch, UserSettings,
};
use study_planner_core::ports::{DatabaseService, PortError, PortResult};
use tokio::sync::RwLock;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Default)]
pub struct MemoryAdapter {
    tables: RwLock<Tables>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, (User, String)>,
    auth_sessions: HashMap<String, (i64, DateTime<Utc>)>,
    settings: HashMap<i64, UserSettings>,
    subjects: BTreeMap<i64, Subject>,
    tasks: BTreeMap<i64, Task>,
    study_sessions: BTreeMap<i64, StudySession>,
    records: BTreeMap<i64, StudyTimeRecord>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn not_found(what: &str, id: i64) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, id))
}

//=========================================================================================
// Natural Keys
//=========================================================================================

fn subject_key(s: &Subject) -> (i64, String) {
    (s.user_id, s.name.clone())
}

fn task_key(t: &Task) -> (i64, String) {
    (t.user_id, t.title.clone())
}

fn session_key(s: &StudySession) -> (i64, String, NaiveDate, NaiveTime) {
    (s.user_id, s.title.clone(), s.date, s.start_time)
}

fn record_key(r: &StudyTimeRecord) -> (i64, NaiveDate, i64, Option<i64>) {
    (r.user_id, r.date, r.subject_id, r.task_id)
}

/// The id of another row in `table` sharing `row`'s key, if any.
fn clash<T, K: PartialEq>(table: &BTreeMap<i64, T>, id: i64, row: &T, key: impl Fn(&T) -> K) -> Option<i64> {
    let wanted = key(row);
    table
        .iter()
        .find(|(other_id, other)| **other_id != id && key(other) == wanted)
        .map(|(other_id, _)| *other_id)
}

//=========================================================================================
// Row Construction
//=========================================================================================

fn subject_row(id: i64, new: NewSubject) -> Subject {
    Subject {
        id,
        user_id: new.user_id,
        name: new.name,
        color: new.color,
        description: new.description,
    }
}

fn task_row(id: i64, new: NewTask) -> Task {
    Task {
        id,
        user_id: new.user_id,
        subject_id: new.subject_id,
        title: new.title,
        description: new.description,
        priority: new.priority,
        due_date: new.due_date,
        estimated_time: new.estimated_time,
        completed: new.completed,
    }
}

fn session_row(id: i64, new: NewStudySession) -> StudySession {
    StudySession {
        id,
        user_id: new.user_id,
        subject_id: new.subject_id,
        title: new.title,
        date: new.date,
        start_time: new.start_time,
        end_time: new.end_time,
        description: new.description,
        completed: new.completed,
        location: new.location,
        participants: new.participants,
    }
}

fn record_row(id: i64, new: NewStudyTimeRecord) -> StudyTimeRecord {
    StudyTimeRecord {
        id,
        user_id: new.user_id,
        subject_id: new.subject_id,
        task_id: new.task_id,
        date: new.date,
        duration: new.duration,
        focus_score: new.focus_score,
    }
}

//=========================================================================================
// Generic Table Operations
//=========================================================================================

/// Inserts `row` unless its key is taken. Returns the stored row and whether it is new.
fn insert_keyed<T: Clone, K: PartialEq>(
    table: &mut BTreeMap<i64, T>,
    id: i64,
    row: T,
    key: impl Fn(&T) -> K,
) -> Upsert<T> {
    if let Some(existing) = clash(table, id, &row, &key) {
        return Upsert {
            row: table[&existing].clone(),
            inserted: false,
        };
    }
    table.insert(id, row.clone());
    Upsert { row, inserted: true }
}

fn create_keyed<T: Clone, K: PartialEq>(
    table: &mut BTreeMap<i64, T>,
    id: i64,
    row: T,
    key: impl Fn(&T) -> K,
    what: &str,
) -> PortResult<T> {
    let upsert = insert_keyed(table, id, row, key);
    if upsert.inserted {
        Ok(upsert.row)
    } else {
        Err(PortError::Conflict(format!("{} already exists", what)))
    }
}

fn update_keyed<T: Clone, K: PartialEq>(
    table: &mut BTreeMap<i64, T>,
    id: i64,
    apply: impl FnOnce(&mut T),
    key: impl Fn(&T) -> K,
    what: &str,
) -> PortResult<T> {
    let mut row = table.get(&id).cloned().ok_or_else(|| not_found(what, id))?;
    apply(&mut row);
    if clash(table, id, &row, &key).is_some() {
        return Err(PortError::Conflict(format!("{} already exists", what)));
    }
    table.insert(id, row.clone());
    Ok(row)
}

fn user_rows<T: Clone>(table: &BTreeMap<i64, T>, owner: impl Fn(&T) -> i64, user_id: i64) -> Vec<T> {
    table.values().filter(|row| owner(row) == user_id).cloned().collect()
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for MemoryAdapter {
    async fn get_user(&self, user_id: i64) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .map(|(user, _)| user.clone())
            .ok_or_else(|| not_found("User", user_id))
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|(user, _)| user.username == username)
            .map(|(user, hash)| UserCredentials {
                user_id: user.id,
                username: user.username.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let upsert = self.ensure_user(new_user).await?;
        if upsert.inserted {
            Ok(upsert.row)
        } else {
            Err(PortError::Conflict("Username is already taken".to_string()))
        }
    }

    async fn update_user(&self, user_id: i64, patch: UserPatch) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if let Some(username) = &patch.username {
            let taken = tables
                .users
                .values()
                .any(|(user, _)| user.id != user_id && &user.username == username);
            if taken {
                return Err(PortError::Conflict("Username is already taken".to_string()));
            }
        }
        let (user, _) = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        user.apply(patch);
        Ok(user.clone())
    }

    async fn ensure_user(&self, new_user: NewUser) -> PortResult<Upsert<User>> {
        let mut tables = self.tables.write().await;
        if let Some((user, _)) = tables.users.values().find(|(u, _)| u.username == new_user.username) {
            return Ok(Upsert {
                row: user.clone(),
                inserted: false,
            });
        }
        let id = tables.allocate_id();
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
        };
        tables.users.insert(id, (user.clone(), new_user.hashed_password));
        Ok(Upsert {
            row: user,
            inserted: true,
        })
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(not_found("User", user_id));
        }
        tables
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<i64> {
        let tables = self.tables.read().await;
        match tables.auth_sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn get_settings(&self, user_id: i64) -> PortResult<UserSettings> {
        let tables = self.tables.read().await;
        if !tables.users.contains_key(&user_id) {
            return Err(not_found("User", user_id));
        }
        Ok(tables.settings.get(&user_id).copied().unwrap_or_default())
    }

    async fn save_settings(&self, user_id: i64, settings: UserSettings) -> PortResult<UserSettings> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(not_found("User", user_id));
        }
        tables.settings.insert(user_id, settings);
        Ok(settings)
    }

    // --- Subjects ---

    async fn list_subjects(&self, user_id: i64) -> PortResult<Vec<Subject>> {
        let tables = self.tables.read().await;
        Ok(user_rows(&tables.subjects, |s: &Subject| s.user_id, user_id))
    }

    async fn get_subject(&self, subject_id: i64) -> PortResult<Subject> {
        let tables = self.tables.read().await;
        tables
            .subjects
            .get(&subject_id)
            .cloned()
            .ok_or_else(|| not_found("Subject", subject_id))
    }

    async fn create_subject(&self, new_subject: NewSubject) -> PortResult<Subject> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        create_keyed(&mut tables.subjects, id, subject_row(id, new_subject), subject_key, "Subject")
    }

    async fn update_subject(&self, subject_id: i64, patch: SubjectPatch) -> PortResult<Subject> {
        let mut tables = self.tables.write().await;
        update_keyed(&mut tables.subjects, subject_id, |s: &mut Subject| s.apply(patch), subject_key, "Subject")
    }

    async fn delete_subject(&self, subject_id: i64) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .subjects
            .remove(&subject_id)
            .ok_or_else(|| not_found("Subject", subject_id))?;
        for task in tables.tasks.values_mut().filter(|t| t.subject_id == Some(subject_id)) {
            task.subject_id = None;
        }
        for session in tables
            .study_sessions
            .values_mut()
            .filter(|s| s.subject_id == Some(subject_id))
        {
            session.subject_id = None;
        }
        tables.records.retain(|_, r| r.subject_id != subject_id);
        Ok(())
    }

    async fn insert_subject_if_absent(&self, new_subject: NewSubject) -> PortResult<Upsert<Subject>> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        Ok(insert_keyed(&mut tables.subjects, id, subject_row(id, new_subject), subject_key))
    }

    // --- Tasks ---

    async fn list_tasks(&self, user_id: i64) -> PortResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(user_rows(&tables.tasks, |t: &Task| t.user_id, user_id))
    }

    async fn get_task(&self, task_id: i64) -> PortResult<Task> {
        let tables = self.tables.read().await;
        tables
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| not_found("Task", task_id))
    }

    async fn create_task(&self, new_task: NewTask) -> PortResult<Task> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        create_keyed(&mut tables.tasks, id, task_row(id, new_task), task_key, "Task")
    }

    async fn update_task(&self, task_id: i64, patch: TaskPatch) -> PortResult<Task> {
        let mut tables = self.tables.write().await;
        update_keyed(&mut tables.tasks, task_id, |t: &mut Task| t.apply(patch), task_key, "Task")
    }

    async fn delete_task(&self, task_id: i64) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .tasks
            .remove(&task_id)
            .ok_or_else(|| not_found("Task", task_id))?;
        for record in tables.records.values_mut().filter(|r| r.task_id == Some(task_id)) {
            record.task_id = None;
        }
        Ok(())
    }

    async fn insert_task_if_absent(&self, new_task: NewTask) -> PortResult<Upsert<Task>> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        Ok(insert_keyed(&mut tables.tasks, id, task_row(id, new_task), task_key))
    }

    // --- Study Sessions ---

    async fn list_study_sessions(&self, user_id: i64) -> PortResult<Vec<StudySession>> {
        let tables = self.tables.read().await;
        Ok(user_rows(&tables.study_sessions, |s: &StudySession| s.user_id, user_id))
    }

    async fn get_study_session(&self, session_id: i64) -> PortResult<StudySession> {
        let tables = self.tables.read().await;
        tables
            .study_sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| not_found("Study session", session_id))
    }

    async fn create_study_session(&self, new_session: NewStudySession) -> PortResult<StudySession> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        create_keyed(
            &mut tables.study_sessions,
            id,
            session_row(id, new_session),
            session_key,
            "Study session",
        )
    }

    async fn update_study_session(
        &self,
        session_id: i64,
        patch: StudySessionPatch,
    ) -> PortResult<StudySession> {
        let mut tables = self.tables.write().await;
        update_keyed(
            &mut tables.study_sessions,
            session_id,
            |s: &mut StudySession| s.apply(patch),
            session_key,
            "Study session",
        )
    }

    async fn delete_study_session(&self, session_id: i64) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .study_sessions
            .remove(&session_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Study session", session_id))
    }

    async fn insert_study_session_if_absent(
        &self,
        new_session: NewStudySession,
    ) -> PortResult<Upsert<StudySession>> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        Ok(insert_keyed(
            &mut tables.study_sessions,
            id,
            session_row(id, new_session),
            session_key,
        ))
    }

    // --- Study Time Records ---

    async fn list_study_time_records(&self, user_id: i64) -> PortResult<Vec<StudyTimeRecord>> {
        let tables = self.tables.read().await;
        Ok(user_rows(&tables.records, |r: &StudyTimeRecord| r.user_id, user_id))
    }

    async fn get_study_time_record(&self, record_id: i64) -> PortResult<StudyTimeRecord> {
        let tables = self.tables.read().await;
        tables
            .records
            .get(&record_id)
            .cloned()
            .ok_or_else(|| not_found("Study time record", record_id))
    }

    async fn create_study_time_record(
        &self,
        new_record: NewStudyTimeRecord,
    ) -> PortResult<StudyTimeRecord> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        create_keyed(
            &mut tables.records,
            id,
            record_row(id, new_record),
            record_key,
            "Study time record",
        )
    }

    async fn update_study_time_record(
        &self,
        record_id: i64,
        patch: StudyTimeRecordPatch,
    ) -> PortResult<StudyTimeRecord> {
        let mut tables = self.tables.write().await;
        update_keyed(
            &mut tables.records,
            record_id,
            |r: &mut StudyTimeRecord| r.apply(patch),
            record_key,
            "Study time record",
        )
    }

    async fn delete_study_time_record(&self, record_id: i64) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .records
            .remove(&record_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Study time record", record_id))
    }

    async fn insert_study_time_record_if_absent(
        &self,
        new_record: NewStudyTimeRecord,
    ) -> PortResult<Upsert<StudyTimeRecord>> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        Ok(insert_keyed(&mut tables.records, id, record_row(id, new_record), record_key))
    }
}
