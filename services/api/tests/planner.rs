//! Planner behavior (ownership, references, cascades and natural keys) over the
//! in-memory store.

mod common;

use api_lib::adapters::MemoryAdapter;
use common::{add_user, date};
use std::sync::Arc;
use study_planner_core::domain::{
    CurrentUser, NewStudySession, NewStudyTimeRecord, NewSubject, NewTask, Priority,
    StudySessionPatch, Subject, SubjectPatch, Task, TaskPatch,
};
use study_planner_core::ports::{DatabaseService, PortError};
use study_planner_core::Planner;

async fn setup() -> (Planner, CurrentUser, CurrentUser) {
    let db: Arc<dyn DatabaseService> = Arc::new(MemoryAdapter::new());
    let ada = add_user(db.as_ref(), "ada").await;
    let grace = add_user(db.as_ref(), "grace").await;
    (Planner::new(db), ada, grace)
}

fn new_subject(name: &str) -> NewSubject {
    NewSubject {
        user_id: 0,
        name: name.to_string(),
        color: "blue".to_string(),
        description: None,
    }
}

fn new_task(title: &str, subject_id: Option<i64>) -> NewTask {
    NewTask {
        user_id: 0,
        subject_id,
        title: title.to_string(),
        description: None,
        priority: Priority::Medium,
        due_date: Some(date("2026-10-20")),
        estimated_time: Some(60),
        completed: false,
    }
}

async fn subject(planner: &Planner, user: &CurrentUser, name: &str) -> Subject {
    planner.create_subject(user, new_subject(name)).await.unwrap()
}

async fn task(planner: &Planner, user: &CurrentUser, title: &str, subject_id: Option<i64>) -> Task {
    planner
        .create_task(user, new_task(title, subject_id))
        .await
        .unwrap()
}

#[tokio::test]
async fn creates_are_stamped_with_the_caller() {
    let (planner, ada, _) = setup().await;
    let mut payload = new_subject("Mathematics");
    payload.user_id = 999;

    let created = planner.create_subject(&ada, payload).await.unwrap();
    assert_eq!(created.user_id, ada.id);
    assert_eq!(planner.subjects(&ada).await.unwrap(), vec![created]);
}

#[tokio::test]
async fn other_users_rows_are_invisible() {
    let (planner, ada, grace) = setup().await;
    let math = subject(&planner, &ada, "Mathematics").await;

    assert!(planner.subjects(&grace).await.unwrap().is_empty());
    assert!(matches!(
        planner.subject(&grace, math.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        planner
            .update_subject(&grace, math.id, SubjectPatch::default())
            .await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        planner.delete_subject(&grace, math.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(planner.subject(&ada, math.id).await.is_ok());
}

#[tokio::test]
async fn referencing_another_users_subject_is_invalid() {
    let (planner, ada, grace) = setup().await;
    let math = subject(&planner, &ada, "Mathematics").await;

    let err = planner
        .create_task(&grace, new_task("Homework", Some(math.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Invalid(_)));
    assert!(planner.tasks(&grace).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_absent_row_is_not_found() {
    let (planner, ada, _) = setup().await;
    assert!(matches!(
        planner.delete_task(&ada, 12345).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn duplicate_natural_keys_conflict() {
    let (planner, ada, grace) = setup().await;
    subject(&planner, &ada, "Mathematics").await;

    assert!(matches!(
        planner.create_subject(&ada, new_subject("Mathematics")).await,
        Err(PortError::Conflict(_))
    ));
    // The same name is fine for somebody else.
    assert!(planner.create_subject(&grace, new_subject("Mathematics")).await.is_ok());
}

#[tokio::test]
async fn renaming_onto_an_existing_title_conflicts() {
    let (planner, ada, _) = setup().await;
    task(&planner, &ada, "Essay", None).await;
    let lab = task(&planner, &ada, "Lab report", None).await;

    let patch = TaskPatch {
        title: Some("Essay".to_string()),
        ..TaskPatch::default()
    };
    assert!(matches!(
        planner.update_task(&ada, lab.id, patch).await,
        Err(PortError::Conflict(_))
    ));
}

#[tokio::test]
async fn patches_keep_absent_fields_and_clear_nulls() {
    let (planner, ada, _) = setup().await;
    let math = subject(&planner, &ada, "Mathematics").await;
    let homework = task(&planner, &ada, "Homework", Some(math.id)).await;

    let patch: TaskPatch = serde_json::from_str(r#"{"completed": true}"#).unwrap();
    let updated = planner.update_task(&ada, homework.id, patch).await.unwrap();
    assert!(updated.completed);
    assert_eq!(updated.subject_id, Some(math.id));

    let patch: TaskPatch = serde_json::from_str(r#"{"subjectId": null}"#).unwrap();
    let updated = planner.update_task(&ada, homework.id, patch).await.unwrap();
    assert_eq!(updated.subject_id, None);
    assert!(updated.completed);
}

#[tokio::test]
async fn subject_for_task_follows_the_link() {
    let (planner, ada, _) = setup().await;
    let math = subject(&planner, &ada, "Mathematics").await;
    let linked = task(&planner, &ada, "Homework", Some(math.id)).await;
    let loose = task(&planner, &ada, "Errands", None).await;

    assert_eq!(
        planner.subject_for_task(&ada, linked.id).await.unwrap(),
        Some(math)
    );
    assert_eq!(planner.subject_for_task(&ada, loose.id).await.unwrap(), None);
    assert!(matches!(
        planner.subject_for_task(&ada, 9999).await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_a_subject_unfiles_tasks_and_sessions_and_drops_its_records() {
    let (planner, ada, _) = setup().await;
    let math = subject(&planner, &ada, "Mathematics").await;
    let physics = subject(&planner, &ada, "Physics").await;
    let homework = task(&planner, &ada, "Homework", Some(math.id)).await;

    let session = planner
        .create_study_session(
            &ada,
            NewStudySession {
                user_id: 0,
                subject_id: Some(math.id),
                title: "Morning Math Session".to_string(),
                date: date("2026-10-19"),
                start_time: "08:00".parse().unwrap(),
                end_time: "10:00".parse().unwrap(),
                description: None,
                completed: false,
                location: None,
                participants: 1,
            },
        )
        .await
        .unwrap();
    let record = |subject_id: i64| NewStudyTimeRecord {
        user_id: 0,
        subject_id,
        task_id: None,
        date: date("2026-10-18"),
        duration: 45,
        focus_score: Some(80),
    };
    planner.create_study_time_record(&ada, record(math.id)).await.unwrap();
    let kept = planner
        .create_study_time_record(&ada, record(physics.id))
        .await
        .unwrap();

    planner.delete_subject(&ada, math.id).await.unwrap();

    assert_eq!(planner.task(&ada, homework.id).await.unwrap().subject_id, None);
    assert_eq!(
        planner.study_session(&ada, session.id).await.unwrap().subject_id,
        None
    );
    assert_eq!(planner.study_time_records(&ada).await.unwrap(), vec![kept]);
}

#[tokio::test]
async fn deleting_a_task_unlinks_its_records() {
    let (planner, ada, _) = setup().await;
    let math = subject(&planner, &ada, "Mathematics").await;
    let homework = task(&planner, &ada, "Homework", Some(math.id)).await;
    let record = planner
        .create_study_time_record(
            &ada,
            NewStudyTimeRecord {
                user_id: 0,
                subject_id: math.id,
                task_id: Some(homework.id),
                date: date("2026-10-18"),
                duration: 25,
                focus_score: None,
            },
        )
        .await
        .unwrap();

    planner.delete_task(&ada, homework.id).await.unwrap();

    let after = planner.study_time_record(&ada, record.id).await.unwrap();
    assert_eq!(after.task_id, None);
    assert_eq!(after.duration, 25);
}

#[tokio::test]
async fn records_need_a_positive_duration_and_an_owned_task() {
    let (planner, ada, grace) = setup().await;
    let math = subject(&planner, &ada, "Mathematics").await;
    let graces_task = task(&planner, &grace, "Hers", None).await;

    let mut record = NewStudyTimeRecord {
        user_id: 0,
        subject_id: math.id,
        task_id: None,
        date: date("2026-10-18"),
        duration: 0,
        focus_score: None,
    };
    assert!(matches!(
        planner.create_study_time_record(&ada, record.clone()).await,
        Err(PortError::Invalid(_))
    ));

    record.duration = 30;
    record.task_id = Some(graces_task.id);
    assert!(matches!(
        planner.create_study_time_record(&ada, record).await,
        Err(PortError::Invalid(_))
    ));
}

#[tokio::test]
async fn sessions_cannot_end_before_they_start() {
    let (planner, ada, _) = setup().await;
    let session = planner
        .create_study_session(
            &ada,
            NewStudySession {
                user_id: 0,
                subject_id: None,
                title: "Review".to_string(),
                date: date("2026-10-19"),
                start_time: "13:00".parse().unwrap(),
                end_time: "15:30".parse().unwrap(),
                description: None,
                completed: false,
                location: None,
                participants: 1,
            },
        )
        .await
        .unwrap();

    let patch = StudySessionPatch {
        end_time: Some("12:00".parse().unwrap()),
        ..StudySessionPatch::default()
    };
    assert!(matches!(
        planner.update_study_session(&ada, session.id, patch).await,
        Err(PortError::Invalid(_))
    ));
    assert_eq!(
        planner.study_session(&ada, session.id).await.unwrap().end_time,
        session.end_time
    );
}
