//! crates/study_planner_core/src/domain.rs
//!
//! Defines the core data structures for the study planner.
//! These structs are independent of any database; they carry serde derives so the
//! web layer can hand them to clients without a parallel set of DTOs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Deserializes a field that distinguishes "absent" (outer `None`) from an explicit
/// `null` (inner `None`). Must be paired with `#[serde(default)]`.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

//=========================================================================================
// Request Context
//=========================================================================================

/// The user a request acts on behalf of. Resolved once per request by the auth
/// layer and passed explicitly to every planner and seeder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

//=========================================================================================
// Users
//=========================================================================================

/// Represents a user account - used throughout the app. The password hash lives
/// in `UserCredentials` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: i64,
    pub username: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Per-user preferences edited on the settings page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub dark_mode: bool,
    pub notifications: bool,
    pub show_completed: bool,
    pub auto_break: bool,
    /// Minutes.
    pub focus_duration: i32,
    pub short_break_duration: i32,
    pub long_break_duration: i32,
    pub sessions_before_long_break: i32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications: true,
            show_completed: true,
            auto_break: true,
            focus_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            sessions_before_long_break: 4,
        }
    }
}

//=========================================================================================
// Subjects
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// A UI theme label such as "blue" or "amber".
    pub color: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    #[serde(default)]
    pub user_id: i64,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub description: Option<Option<String>>,
}

//=========================================================================================
// Tasks
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority '{0}'")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub subject_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    /// Minutes.
    pub estimated_time: Option<i32>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub subject_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_time: Option<i32>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub subject_id: Option<Option<i64>>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<NaiveDate>))]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i32>))]
    pub estimated_time: Option<Option<i32>>,
    pub completed: Option<bool>,
}

//=========================================================================================
// Study Sessions
//=========================================================================================

/// A scheduled or logged study block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: i64,
    pub user_id: i64,
    pub subject_id: Option<i64>,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
    pub completed: bool,
    pub location: Option<String>,
    pub participants: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewStudySession {
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub subject_id: Option<i64>,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_participants")]
    pub participants: i32,
}

fn default_participants() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudySessionPatch {
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub subject_id: Option<Option<i64>>,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub location: Option<Option<String>>,
    pub participants: Option<i32>,
}

//=========================================================================================
// Study Time Records
//=========================================================================================

/// Time actually spent studying, aggregated by the progress views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudyTimeRecord {
    pub id: i64,
    pub user_id: i64,
    pub subject_id: i64,
    pub task_id: Option<i64>,
    pub date: NaiveDate,
    /// Minutes.
    pub duration: i32,
    pub focus_score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewStudyTimeRecord {
    #[serde(default)]
    pub user_id: i64,
    pub subject_id: i64,
    #[serde(default)]
    pub task_id: Option<i64>,
    pub date: NaiveDate,
    pub duration: i32,
    #[serde(default)]
    pub focus_score: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudyTimeRecordPatch {
    pub subject_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub task_id: Option<Option<i64>>,
    pub date: Option<NaiveDate>,
    pub duration: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i32>))]
    pub focus_score: Option<Option<i32>>,
}

//=========================================================================================
// Patch Application
//=========================================================================================
// Shared by every adapter so "merge partial into existing" means the same thing
// regardless of the backing store.

impl User {
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
    }
}

impl Subject {
    pub fn apply(&mut self, patch: SubjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }
}

impl Task {
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(subject_id) = patch.subject_id {
            self.subject_id = subject_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(estimated_time) = patch.estimated_time {
            self.estimated_time = estimated_time;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

impl StudySession {
    pub fn apply(&mut self, patch: StudySessionPatch) {
        if let Some(subject_id) = patch.subject_id {
            self.subject_id = subject_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            self.end_time = end_time;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(participants) = patch.participants {
            self.participants = participants;
        }
    }
}

impl StudyTimeRecord {
    pub fn apply(&mut self, patch: StudyTimeRecordPatch) {
        if let Some(subject_id) = patch.subject_id {
            self.subject_id = subject_id;
        }
        if let Some(task_id) = patch.task_id {
            self.task_id = task_id;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(focus_score) = patch.focus_score {
            self.focus_score = focus_score;
        }
    }
}

/// The outcome of an insert-if-absent call: the row stored under the natural key,
/// and whether this call created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert<T> {
    pub row: T,
    pub inserted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_patch_distinguishes_null_from_absent() {
        let cleared: TaskPatch = serde_json::from_str(r#"{"subjectId": null}"#).unwrap();
        assert_eq!(cleared.subject_id, Some(None));

        let untouched: TaskPatch = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(untouched.subject_id, None);
        assert_eq!(untouched.completed, Some(true));
    }

    #[test]
    fn applying_a_patch_only_touches_named_fields() {
        let mut task = Task {
            id: 1,
            user_id: 1,
            subject_id: Some(3),
            title: "Physics Lab Report".to_string(),
            description: None,
            priority: Priority::High,
            due_date: None,
            estimated_time: Some(180),
            completed: false,
        };
        task.apply(TaskPatch {
            completed: Some(true),
            subject_id: Some(None),
            ..Default::default()
        });
        assert!(task.completed);
        assert_eq!(task.subject_id, None);
        assert_eq!(task.title, "Physics Lab Report");
        assert_eq!(task.estimated_time, Some(180));
    }

    #[test]
    fn new_session_accepts_short_clock_times() {
        let session: NewStudySession = serde_json::from_str(
            r#"{"title":"Morning Math Session","date":"2026-10-19","startTime":"08:00","endTime":"10:00"}"#,
        )
        .unwrap();
        assert_eq!(session.start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(session.participants, 1);
        assert!(!session.completed);
    }

    #[test]
    fn priority_round_trips_through_its_wire_name() {
        assert_eq!("medium".parse::<Priority>(), Ok(Priority::Medium));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "\"low\"");
    }
}
