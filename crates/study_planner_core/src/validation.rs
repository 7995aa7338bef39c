//! crates/study_planner_core/src/validation.rs
//!
//! Form payloads and their field constraints. Handlers call `validate()` before
//! touching storage, so a rejected form never reaches the database.

use serde::Deserialize;
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::domain::{NewTask, Priority, TaskPatch, UserPatch, UserSettings};

#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LoginForm {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(
        length(min = 6, message = "Password must be at least 6 characters"),
        must_match(other = "password", message = "Passwords don't match")
    )]
    pub confirm_password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl From<ProfileForm> for UserPatch {
    fn from(form: ProfileForm) -> Self {
        UserPatch {
            username: Some(form.username),
            email: Some(form.email),
            first_name: form.first_name,
            last_name: form.last_name,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AppSettingsForm {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "enabled")]
    pub notifications: bool,
    #[serde(default = "enabled")]
    pub show_completed: bool,
    #[serde(default = "enabled")]
    pub auto_break: bool,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSettingsForm {
    #[validate(range(min = 5, max = 120, message = "Focus duration must be between 5 and 120 minutes"))]
    pub focus_duration: i32,
    #[validate(range(min = 1, max = 30, message = "Short break must be between 1 and 30 minutes"))]
    pub short_break_duration: i32,
    #[validate(range(min = 5, max = 60, message = "Long break must be between 5 and 60 minutes"))]
    pub long_break_duration: i32,
    #[validate(range(min = 1, max = 10, message = "Sessions must be between 1 and 10"))]
    pub sessions_before_long_break: i32,
}

/// The settings page submits both tabs together.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    #[validate(nested)]
    pub app: AppSettingsForm,
    #[validate(nested)]
    pub pomodoro: PomodoroSettingsForm,
}

impl From<SettingsForm> for UserSettings {
    fn from(form: SettingsForm) -> Self {
        UserSettings {
            dark_mode: form.app.dark_mode,
            notifications: form.app.notifications,
            show_completed: form.app.show_completed,
            auto_break: form.app.auto_break,
            focus_duration: form.pomodoro.focus_duration,
            short_break_duration: form.pomodoro.short_break_duration,
            long_break_duration: form.pomodoro.long_break_duration,
            sessions_before_long_break: form.pomodoro.sessions_before_long_break,
        }
    }
}

/// The shared create/edit task modal.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    #[serde(default)]
    pub subject_id: Option<i64>,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<chrono::NaiveDate>,
    #[validate(range(min = 0, message = "Estimated time cannot be negative"))]
    #[serde(default)]
    pub estimated_time: Option<i32>,
    #[serde(default)]
    pub completed: bool,
}

impl TaskForm {
    pub fn into_new_task(self, user_id: i64) -> NewTask {
        NewTask {
            user_id,
            subject_id: self.subject_id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            estimated_time: self.estimated_time,
            completed: self.completed,
        }
    }

    /// Editing submits the whole form, so every field overwrites the stored one.
    pub fn into_patch(self) -> TaskPatch {
        TaskPatch {
            subject_id: Some(self.subject_id),
            title: Some(self.title),
            description: Some(self.description),
            priority: Some(self.priority),
            due_date: Some(self.due_date),
            estimated_time: Some(self.estimated_time),
            completed: Some(self.completed),
        }
    }
}

/// Flattens validation errors into `{ "fieldName": ["message", ...] }` with the
/// camelCase field names the client sends. Nested forms use dotted paths.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    collect_messages(errors, "", &mut out);
    out
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut BTreeMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = format!("{}{}", prefix, camel_case(field));
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = list
                    .iter()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("invalid value ({})", e.code),
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_messages(inner, &format!("{}.", path), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{}[{}].", path, index), out);
                }
            }
        }
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: "student".to_string(),
            email: "student@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn register_rejects_mismatched_confirmation_on_that_field() {
        let errors = register("abc123", "abc124").validate().unwrap_err();
        let fields = field_messages(&errors);
        assert_eq!(fields.get("confirmPassword"), Some(&vec!["Passwords don't match".to_string()]));
        assert!(!fields.contains_key("password"));
    }

    #[test]
    fn register_accepts_matching_passwords() {
        assert!(register("abc123", "abc123").validate().is_ok());
    }

    #[test]
    fn register_rejects_bad_email() {
        let mut form = register("abc123", "abc123");
        form.email = "not-an-email".to_string();
        let errors = form.validate().unwrap_err();
        assert!(field_messages(&errors).contains_key("email"));
    }

    #[test]
    fn login_rejects_two_character_username() {
        let form = LoginForm {
            username: "ab".to_string(),
            password: "password".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(field_messages(&errors).contains_key("username"));
    }

    #[test]
    fn pomodoro_ranges_are_enforced() {
        let mut form = PomodoroSettingsForm {
            focus_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            sessions_before_long_break: 4,
        };
        assert!(form.validate().is_ok());

        form.focus_duration = 121;
        form.sessions_before_long_break = 0;
        let errors = form.validate().unwrap_err();
        let fields = field_messages(&errors);
        assert!(fields.contains_key("focusDuration"));
        assert!(fields.contains_key("sessionsBeforeLongBreak"));
        assert!(!fields.contains_key("shortBreakDuration"));
    }

    #[test]
    fn nested_settings_errors_use_dotted_paths() {
        let form: SettingsForm = serde_json::from_str(
            r#"{"app":{},"pomodoro":{"focusDuration":4,"shortBreakDuration":5,"longBreakDuration":15,"sessionsBeforeLongBreak":4}}"#,
        )
        .unwrap();
        assert!(form.app.notifications);
        let errors = form.validate().unwrap_err();
        assert!(field_messages(&errors).contains_key("pomodoro.focusDuration"));
    }

    #[test]
    fn camel_case_keeps_simple_names() {
        assert_eq!(camel_case("username"), "username");
        assert_eq!(camel_case("confirm_password"), "confirmPassword");
    }

    #[test]
    fn task_form_needs_a_title() {
        let form: TaskForm = serde_json::from_str(r#"{"title":"","priority":"low"}"#).unwrap();
        assert!(form.validate().is_err());

        let form: TaskForm =
            serde_json::from_str(r#"{"title":"Physics Lab Report","priority":"high","estimatedTime":180}"#)
                .unwrap();
        assert!(form.validate().is_ok());
        let task = form.into_new_task(7);
        assert_eq!(task.user_id, 7);
        assert_eq!(task.estimated_time, Some(180));
    }
}
