//! crates/study_planner_core/src/seed.rs
//!
//! Populates a demonstration dataset for a first-run user. Every row goes through
//! an `insert_*_if_absent` call keyed on its natural key, so seeding is idempotent
//! and safe to run concurrently for the same user.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use rand::Rng;
use serde::Serialize;
use tracing::info;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::domain::{
    CurrentUser, NewStudySession, NewStudyTimeRecord, NewSubject, NewTask, NewUser, Priority,
    Subject, Task,
};
use crate::ports::{DatabaseService, PortResult};

pub const DEMO_USERNAME: &str = "student";
pub const DEMO_PASSWORD: &str = "password";

/// Counts reported back to the dashboard after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub subjects_count: usize,
    pub tasks_count: usize,
    pub sessions_count: usize,
    /// Sample records present after seeding, whether this call inserted them or not.
    pub records_count: usize,
}

/// The account used for guest access and as the owner of the demo data.
pub fn demo_user(hashed_password: String) -> NewUser {
    NewUser {
        username: DEMO_USERNAME.to_string(),
        email: "student@example.com".to_string(),
        first_name: "Student".to_string(),
        last_name: "User".to_string(),
        hashed_password,
    }
}

/// A stable RNG seed for one user on one day, so repeated seeding on the same day
/// draws the same sample records.
pub fn daily_seed(user_id: i64, today: NaiveDate) -> u64 {
    ((user_id as u64) << 32) ^ (today.num_days_from_ce() as u64)
}

const SUBJECTS: [(&str, &str, &str); 5] = [
    ("Mathematics", "blue", "Algebra, Calculus, and Statistics"),
    ("Computer Science", "purple", "Programming, Algorithms, and Data Structures"),
    ("Physics", "green", "Mechanics, Thermodynamics, and Electromagnetism"),
    ("Literature", "red", "Fiction, Poetry, and Literary Analysis"),
    ("History", "amber", "World History and Historical Events"),
];

enum Due {
    Tomorrow,
    NextWeek,
}

// (title, subject index, priority, due, description, estimated minutes)
const TASKS: [(&str, usize, Priority, Due, &str, i32); 7] = [
    ("Complete Calculus Assignment", 0, Priority::High, Due::Tomorrow, "Solve problems 1-10 in Chapter 4", 120),
    ("Study Algorithm Complexity", 1, Priority::Medium, Due::NextWeek, "Review Big O notation and solve example problems", 90),
    ("Physics Lab Report", 2, Priority::High, Due::Tomorrow, "Write lab report on the pendulum experiment", 180),
    ("Read Shakespeare's Hamlet", 3, Priority::Low, Due::NextWeek, "Read Act 1 and take notes on main themes", 120),
    ("Research Industrial Revolution", 4, Priority::Medium, Due::NextWeek, "Gather sources for upcoming history essay", 150),
    ("Prepare for Math Quiz", 0, Priority::High, Due::Tomorrow, "Review integration techniques and practice problems", 120),
    ("Code Portfolio Project", 1, Priority::Medium, Due::NextWeek, "Implement the frontend design for personal website", 240),
];

// (title, days from today, subject index, start, end, description, location, participants)
const SESSIONS: [(&str, i64, usize, (u32, u32), (u32, u32), &str, &str, i32); 5] = [
    ("Morning Math Session", 0, 0, (8, 0), (10, 0), "Focus on calculus problems", "Library Study Room 3", 1),
    ("Programming Practice", 0, 1, (13, 0), (15, 30), "Work on coding challenges and algorithm implementation", "Home Office", 1),
    ("Physics Study Group", 1, 2, (16, 0), (18, 0), "Group study for upcoming physics exam", "Science Building Room 202", 4),
    ("Literature Analysis", 2, 3, (10, 0), (11, 30), "Analyze themes in Shakespeare's works", "Campus Coffee Shop", 1),
    ("History Research", 2, 4, (14, 0), (16, 0), "Library research for history essay", "University Library", 1),
];

const RECORD_DAYS: i64 = 7;
const RECORD_PROBABILITY: f64 = 0.7;

fn clock(hm: (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hm.0, hm.1, 0).unwrap_or_default()
}

/// Seeds subjects, tasks, sessions and a week of study-time records for `user`.
///
/// Not transactional: a failure part-way leaves the rows inserted so far in place,
/// and a later call picks up where it stopped.
pub async fn seed_sample_data<R: Rng + Send>(
    db: &dyn DatabaseService,
    user: &CurrentUser,
    today: NaiveDate,
    rng: &mut R,
) -> PortResult<SeedSummary> {
    // Refuses to seed for a user the store does not know.
    db.get_user(user.id).await?;

    let mut subjects: Vec<Subject> = Vec::with_capacity(SUBJECTS.len());
    let mut inserted_subjects = 0;
    for (name, color, description) in SUBJECTS {
        let upsert = db
            .insert_subject_if_absent(NewSubject {
                user_id: user.id,
                name: name.to_string(),
                color: color.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
        inserted_subjects += usize::from(upsert.inserted);
        subjects.push(upsert.row);
    }

    let tomorrow = today + Duration::days(1);
    let next_week = today + Duration::days(7);
    let mut tasks: Vec<Task> = Vec::with_capacity(TASKS.len());
    let mut inserted_tasks = 0;
    for (title, subject_index, priority, due, description, estimate) in TASKS {
        let due_date = match due {
            Due::Tomorrow => tomorrow,
            Due::NextWeek => next_week,
        };
        let upsert = db
            .insert_task_if_absent(NewTask {
                user_id: user.id,
                subject_id: Some(subjects[subject_index].id),
                title: title.to_string(),
                description: Some(description.to_string()),
                priority,
                due_date: Some(due_date),
                estimated_time: Some(estimate),
                completed: false,
            })
            .await?;
        inserted_tasks += usize::from(upsert.inserted);
        tasks.push(upsert.row);
    }

    let mut inserted_sessions = 0;
    for (title, offset, subject_index, start, end, description, location, participants) in SESSIONS {
        let upsert = db
            .insert_study_session_if_absent(NewStudySession {
                user_id: user.id,
                subject_id: Some(subjects[subject_index].id),
                title: title.to_string(),
                date: today + Duration::days(offset),
                start_time: clock(start),
                end_time: clock(end),
                description: Some(description.to_string()),
                completed: false,
                location: Some(location.to_string()),
                participants,
            })
            .await?;
        inserted_sessions += usize::from(upsert.inserted);
    }

    let records = sample_records(user.id, today, &subjects, &tasks, rng);
    let mut inserted_records = 0;
    for record in records.iter().cloned() {
        let upsert = db.insert_study_time_record_if_absent(record).await?;
        inserted_records += usize::from(upsert.inserted);
    }

    info!(
        user_id = user.id,
        inserted_subjects, inserted_tasks, inserted_sessions, inserted_records, "Sample data seeded"
    );

    Ok(SeedSummary {
        subjects_count: subjects.len(),
        tasks_count: tasks.len(),
        sessions_count: SESSIONS.len(),
        records_count: records.len(),
    })
}

/// Draws study-time records for each of the seven days before `today`: every
/// subject studies on a given day with probability 0.7, for 30 to 149 minutes, at a
/// focus score of 60 to 99.
fn sample_records<R: Rng>(
    user_id: i64,
    today: NaiveDate,
    subjects: &[Subject],
    tasks: &[Task],
    rng: &mut R,
) -> Vec<NewStudyTimeRecord> {
    let week_ago = today - Duration::days(RECORD_DAYS);
    let mut records = Vec::new();
    if tasks.is_empty() {
        return records;
    }
    for day in 0..RECORD_DAYS {
        let date = week_ago + Duration::days(day);
        for (index, subject) in subjects.iter().enumerate() {
            if !rng.gen_bool(RECORD_PROBABILITY) {
                continue;
            }
            records.push(NewStudyTimeRecord {
                user_id,
                subject_id: subject.id,
                task_id: Some(tasks[index % tasks.len()].id),
                date,
                duration: rng.gen_range(30..150),
                focus_score: Some(rng.gen_range(60..100)),
            });
        }
    }
    records
}
