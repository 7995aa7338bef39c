//! crates/study_planner_core/src/views.rs
//!
//! Derived, read-only views over a user's rows: task filtering, today's schedule,
//! upcoming deadlines, study statistics and the dashboard that composes them.
//! Everything here is pure; callers fetch the rows and pass them in.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::domain::{Priority, StudySession, StudyTimeRecord, Subject, Task, User, UserSettings};

pub const DASHBOARD_TASK_LIMIT: usize = 3;
pub const DASHBOARD_DEADLINE_LIMIT: usize = 5;

//=========================================================================================
// Tasks
//=========================================================================================

/// The priority selector on the active-task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    High,
    Medium,
    Low,
}

impl PriorityFilter {
    pub fn matches(&self, priority: Priority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::High => priority == Priority::High,
            PriorityFilter::Medium => priority == Priority::Medium,
            PriorityFilter::Low => priority == Priority::Low,
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = crate::domain::UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PriorityFilter::All),
            other => Ok(match other.parse::<Priority>()? {
                Priority::High => PriorityFilter::High,
                Priority::Medium => PriorityFilter::Medium,
                Priority::Low => PriorityFilter::Low,
            }),
        }
    }
}

/// Incomplete tasks matching `filter`, in list order, at most `limit` of them.
pub fn filter_active_tasks(tasks: &[Task], filter: PriorityFilter, limit: usize) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| !task.completed && filter.matches(task.priority))
        .take(limit)
        .cloned()
        .collect()
}

/// The subject a task is filed under. `None` when the task is unknown, has no
/// subject, or points at a subject missing from `subjects`.
pub fn subject_for_task<'a>(tasks: &[Task], subjects: &'a [Subject], task_id: i64) -> Option<&'a Subject> {
    let subject_id = tasks.iter().find(|task| task.id == task_id)?.subject_id?;
    subjects.iter().find(|subject| subject.id == subject_id)
}

//=========================================================================================
// Schedule
//=========================================================================================

/// Sessions on `today`, earliest start first.
pub fn today_sessions(sessions: &[StudySession], today: NaiveDate) -> Vec<StudySession> {
    let mut todays: Vec<StudySession> = sessions.iter().filter(|s| s.date == today).cloned().collect();
    todays.sort_by_key(|s| (s.start_time, s.id));
    todays
}

/// Incomplete tasks due today or later, soonest first.
pub fn upcoming_deadlines(tasks: &[Task], today: NaiveDate, limit: usize) -> Vec<Task> {
    let mut upcoming: Vec<Task> = tasks
        .iter()
        .filter(|task| !task.completed && matches!(task.due_date, Some(due) if due >= today))
        .cloned()
        .collect();
    upcoming.sort_by_key(|task| (task.due_date, task.id));
    upcoming.truncate(limit);
    upcoming
}

//=========================================================================================
// Stats
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    /// Minutes studied today.
    pub today_study_time: i32,
    /// Minutes per day from Monday to Sunday of the current week, zero-filled.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub weekly_totals: BTreeMap<NaiveDate, i32>,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// Consecutive study days up to today (or yesterday, while today is still empty).
    pub streak: u32,
    /// Mean focus score of this week's records, 0 when there are none.
    pub focus_score: i32,
    pub tasks_completed: usize,
    pub tasks_total: usize,
}

/// Monday and Sunday of the ISO week containing `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    (start, start + Duration::days(6))
}

pub fn streak(records: &[StudyTimeRecord], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = records
        .iter()
        .filter(|r| r.duration > 0 && r.date <= today)
        .map(|r| r.date)
        .collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut count = 0;
    while days.contains(&day) {
        count += 1;
        day -= Duration::days(1);
    }
    count
}

pub fn compute_stats(records: &[StudyTimeRecord], tasks: &[Task], today: NaiveDate) -> StudyStats {
    let (week_start, week_end) = week_bounds(today);

    let mut weekly_totals: BTreeMap<NaiveDate, i32> = (0..7)
        .map(|offset| (week_start + Duration::days(offset), 0))
        .collect();
    let mut focus_sum = 0i64;
    let mut focus_count = 0i64;
    for record in records.iter().filter(|r| r.date >= week_start && r.date <= week_end) {
        if let Some(total) = weekly_totals.get_mut(&record.date) {
            *total += record.duration;
        }
        if let Some(score) = record.focus_score {
            focus_sum += score as i64;
            focus_count += 1;
        }
    }

    let focus_score = if focus_count == 0 {
        0
    } else {
        (focus_sum as f64 / focus_count as f64).round() as i32
    };

    StudyStats {
        today_study_time: records.iter().filter(|r| r.date == today).map(|r| r.duration).sum(),
        weekly_totals,
        week_start,
        week_end,
        streak: streak(records, today),
        focus_score,
        tasks_completed: tasks.iter().filter(|t| t.completed).count(),
        tasks_total: tasks.len(),
    }
}

/// Renders minutes the way the stat cards show them: "45m", "2h", "1h 30m".
pub fn format_minutes(minutes: i32) -> String {
    let (hours, rest) = (minutes / 60, minutes % 60);
    match (hours, rest) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StatCard {
    pub title: String,
    pub value: String,
    pub icon: String,
    pub color: String,
}

impl StatCard {
    fn new(title: &str, value: String, icon: &str, color: &str) -> Self {
        Self {
            title: title.to_string(),
            value,
            icon: icon.to_string(),
            color: color.to_string(),
        }
    }
}

/// A task together with its subject, as task rows and deadline rows display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TaskEntry {
    pub task: Task,
    pub subject: Option<Subject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSection<T> {
    pub items: Vec<T>,
    /// Shown in place of the list when `items` is empty.
    pub empty_message: Option<String>,
}

impl<T> ListSection<T> {
    fn new(items: Vec<T>, empty_message: &str) -> Self {
        let empty_message = items.is_empty().then(|| empty_message.to_string());
        Self { items, empty_message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub date_label: String,
    pub greeting: String,
    pub user: User,
    /// Offered only while the user has no tasks at all.
    pub show_sample_data_action: bool,
    pub stat_cards: Vec<StatCard>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub today_schedule: ListSection<StudySession>,
    pub priority_filter: PriorityFilter,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub active_tasks: ListSection<TaskEntry>,
    pub pomodoro: UserSettings,
    pub stats: StudyStats,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub upcoming_deadlines: ListSection<TaskEntry>,
}

/// Everything the dashboard is computed from.
pub struct DashboardInput<'a> {
    pub user: &'a User,
    pub today: NaiveDate,
    pub filter: PriorityFilter,
    pub subjects: &'a [Subject],
    pub tasks: &'a [Task],
    pub sessions: &'a [StudySession],
    pub records: &'a [StudyTimeRecord],
    pub settings: UserSettings,
}

pub fn build_dashboard(input: DashboardInput<'_>) -> DashboardView {
    let DashboardInput {
        user,
        today,
        filter,
        subjects,
        tasks,
        sessions,
        records,
        settings,
    } = input;

    let with_subject = |task: Task| TaskEntry {
        subject: subject_for_task(tasks, subjects, task.id).cloned(),
        task,
    };

    let stats = compute_stats(records, tasks, today);
    let stat_cards = vec![
        StatCard::new("Study Time Today", format_minutes(stats.today_study_time), "clock", "primary"),
        StatCard::new(
            "Tasks Completed",
            format!("{}/{}", stats.tasks_completed, stats.tasks_total),
            "check",
            "green",
        ),
        StatCard::new("Study Streak", format!("{} days", stats.streak), "calendar-alt", "secondary"),
        StatCard::new("Focus Score", format!("{}%", stats.focus_score), "fire", "yellow"),
    ];

    let active: Vec<TaskEntry> = filter_active_tasks(tasks, filter, DASHBOARD_TASK_LIMIT)
        .into_iter()
        .map(with_subject)
        .collect();
    let deadlines: Vec<TaskEntry> = upcoming_deadlines(tasks, today, DASHBOARD_DEADLINE_LIMIT)
        .into_iter()
        .map(with_subject)
        .collect();

    DashboardView {
        date_label: today.format("%A, %B %-d, %Y").to_string(),
        greeting: format!("Welcome back, {} {}!", user.first_name, user.last_name),
        user: user.clone(),
        show_sample_data_action: tasks.is_empty(),
        stat_cards,
        today_schedule: ListSection::new(
            today_sessions(sessions, today),
            "No study sessions scheduled for today.",
        ),
        priority_filter: filter,
        active_tasks: ListSection::new(active, "No active tasks. Create a new task to get started."),
        pomodoro: settings,
        stats,
        upcoming_deadlines: ListSection::new(deadlines, "No upcoming deadlines."),
    }
}
