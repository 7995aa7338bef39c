//! Handler-level tests: the axum handlers are called directly with their
//! extractors, over an in-memory store.

mod common;

use api_lib::error::ApiError;
use api_lib::web::{account, auth, middleware::resolve_user, resources, sample_data, shell, views};
use api_lib::web::extract::{ApiJson, ApiPath, ApiQuery};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Extension;
use common::{add_user, cookie_headers, json_body, memory_state};
use serde_json::json;
use study_planner_core::domain::CurrentUser;
use study_planner_core::pomodoro::PomodoroPhase;
use study_planner_core::ports::PortError;
use study_planner_core::seed::DEMO_USERNAME;
use study_planner_core::views::PriorityFilter;

fn form<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> ApiJson<T> {
    ApiJson(serde_json::from_value(value).unwrap())
}

fn register_form(username: &str, confirm: &str) -> serde_json::Value {
    json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "secret1",
        "confirmPassword": confirm,
        "firstName": "Ada",
        "lastName": "Lovelace"
    })
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn mismatched_passwords_are_rejected_before_storage() {
    let state = memory_state(false);

    let err = auth::register_handler(State(state.clone()), form(register_form("ada", "secret2")))
        .await
        .err()
        .expect("registration should fail");
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(err.into_response()).await;
    assert!(body["fields"]["confirmPassword"].is_array());
    assert!(matches!(
        state.db.get_user_by_username("ada").await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn register_then_use_the_session_cookie() {
    let state = memory_state(false);

    let response = auth::register_handler(State(state.clone()), form(register_form("ada", "secret1")))
        .await
        .unwrap()
        .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);
    let headers = cookie_headers(&response);
    let body = json_body(response).await;
    assert_eq!(body["username"], "ada");
    assert_eq!(body["firstName"], "Ada");
    assert!(body.get("hashedPassword").is_none());

    let user = resolve_user(&state, &headers).await.unwrap();
    assert_eq!(user.username, "ada");

    let me = auth::me_handler(State(state.clone()), Extension(user)).await.unwrap();
    assert_eq!(me.0.email, "ada@example.com");
}

#[tokio::test]
async fn registering_a_taken_username_conflicts() {
    let state = memory_state(false);
    auth::register_handler(State(state.clone()), form(register_form("ada", "secret1")))
        .await
        .unwrap();

    let err = auth::register_handler(State(state.clone()), form(register_form("ada", "secret1")))
        .await
        .err()
        .expect("second registration should fail");
    assert_eq!(err.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn the_demo_username_cannot_be_claimed() {
    let state = memory_state(true);

    let err = auth::register_handler(State(state.clone()), form(register_form(DEMO_USERNAME, "secret1")))
        .await
        .err()
        .expect("registering the demo name should fail");
    assert_eq!(err.status(), StatusCode::CONFLICT);

    let user = add_user(&*state.db, "ada").await;
    let err = account::update_profile_handler(
        State(state.clone()),
        Extension(user),
        form(json!({"username": "Student", "email": "ada@example.com"})),
    )
    .await
    .err()
    .expect("renaming into the demo name should fail");
    assert_eq!(err.status(), StatusCode::CONFLICT);

    // Guests still land on a fresh demo account, not on anyone's real one.
    let guest = resolve_user(&state, &HeaderMap::new()).await.unwrap();
    let demo = state.db.get_user(guest.id).await.unwrap();
    assert_eq!(demo.username, DEMO_USERNAME);
    assert_eq!(demo.email, "student@example.com");
}

#[tokio::test]
async fn login_validates_then_checks_the_password() {
    let state = memory_state(false);
    auth::register_handler(State(state.clone()), form(register_form("ada", "secret1")))
        .await
        .unwrap();

    let short = auth::login_handler(
        State(state.clone()),
        form(json!({"username": "ad", "password": "secret1"})),
    )
    .await
    .err()
    .expect("short username should fail");
    assert_eq!(short.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let wrong = auth::login_handler(
        State(state.clone()),
        form(json!({"username": "ada", "password": "wrong-pass"})),
    )
    .await
    .err()
    .expect("wrong password should fail");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown = auth::login_handler(
        State(state.clone()),
        form(json!({"username": "nobody", "password": "secret1"})),
    )
    .await
    .err()
    .expect("unknown user should fail");
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let response = auth::login_handler(
        State(state.clone()),
        form(json!({"username": "ada", "password": "secret1"})),
    )
    .await
    .unwrap()
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let state = memory_state(false);
    let response = auth::register_handler(State(state.clone()), form(register_form("ada", "secret1")))
        .await
        .unwrap()
        .into_response();
    let headers = cookie_headers(&response);

    let logout = auth::logout_handler(State(state.clone()), headers.clone())
        .await
        .unwrap()
        .into_response();
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let err = resolve_user(&state, &headers).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn guests_act_as_the_demo_user_when_allowed() {
    let state = memory_state(true);

    let first = resolve_user(&state, &HeaderMap::new()).await.unwrap();
    let second = resolve_user(&state, &HeaderMap::new()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.username, DEMO_USERNAME);

    let demo = state.db.get_user(first.id).await.unwrap();
    assert_eq!(demo.email, "student@example.com");
    assert_eq!((demo.first_name.as_str(), demo.last_name.as_str()), ("Student", "User"));
}

#[tokio::test]
async fn guests_are_refused_when_guest_access_is_off() {
    let state = memory_state(false);
    let err = resolve_user(&state, &HeaderMap::new()).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

//=========================================================================================
// Resources, Views and Sample Data
//=========================================================================================

async fn guest(state: &std::sync::Arc<api_lib::web::AppState>) -> CurrentUser {
    resolve_user(state, &HeaderMap::new()).await.unwrap()
}

#[tokio::test]
async fn task_form_errors_are_field_scoped() {
    let state = memory_state(true);
    let user = guest(&state).await;

    let err = resources::create_task_handler(
        State(state.clone()),
        Extension(user),
        form(json!({"title": "", "priority": "high", "estimatedTime": -5})),
    )
    .await
    .err()
    .expect("invalid task should fail");
    let body = json_body(err.into_response()).await;
    assert!(body["fields"]["title"].is_array());
    assert!(body["fields"]["estimatedTime"].is_array());
}

#[tokio::test]
async fn subjects_cannot_be_renamed_to_blank() {
    let state = memory_state(true);
    let user = guest(&state).await;

    let response = resources::create_subject_handler(
        State(state.clone()),
        Extension(user.clone()),
        form(json!({"name": "Physics", "color": "#3b82f6"})),
    )
    .await
    .unwrap()
    .into_response();
    let id = json_body(response).await["id"].as_i64().unwrap();

    let err = resources::update_subject_handler(
        State(state.clone()),
        Extension(user.clone()),
        ApiPath(id),
        form(json!({"name": "  "})),
    )
    .await
    .err()
    .expect("blank rename should fail");
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let subject = resources::get_subject_handler(State(state.clone()), Extension(user), ApiPath(id))
        .await
        .unwrap();
    assert_eq!(subject.0.name, "Physics");
}

#[tokio::test]
async fn tasks_round_trip_through_the_handlers() {
    let state = memory_state(true);
    let user = guest(&state).await;

    let response = resources::create_task_handler(
        State(state.clone()),
        Extension(user.clone()),
        form(json!({"title": "Essay", "priority": "low", "dueDate": "2026-10-25"})),
    )
    .await
    .unwrap()
    .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["priority"], "low");
    assert_eq!(created["dueDate"], "2026-10-25");

    let updated = resources::update_task_handler(
        State(state.clone()),
        Extension(user.clone()),
        ApiPath(id),
        form(json!({"completed": true})),
    )
    .await
    .unwrap();
    assert!(updated.0.completed);
    assert_eq!(updated.0.title, "Essay");

    let status = resources::delete_task_handler(State(state.clone()), Extension(user.clone()), ApiPath(id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = resources::get_task_handler(State(state.clone()), Extension(user), ApiPath(id))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sample_data_lights_up_the_dashboard() {
    let state = memory_state(true);
    let user = guest(&state).await;
    let all = || ApiQuery(views::DashboardQuery { priority: None });

    let empty = views::dashboard_handler(State(state.clone()), Extension(user.clone()), all())
        .await
        .unwrap();
    assert!(empty.0.show_sample_data_action);
    assert_eq!(empty.0.greeting, "Welcome back, Student User!");
    assert_eq!(empty.0.stat_cards.len(), 4);
    assert!(empty.0.active_tasks.items.is_empty());
    assert!(empty.0.active_tasks.empty_message.is_some());

    let summary = sample_data::sample_data_handler(State(state.clone()), Extension(user.clone()))
        .await
        .unwrap();
    assert_eq!(
        (summary.0.subjects_count, summary.0.tasks_count, summary.0.sessions_count),
        (5, 7, 5)
    );
    let again = sample_data::sample_data_handler(State(state.clone()), Extension(user.clone()))
        .await
        .unwrap();
    assert_eq!(summary.0, again.0);

    let seeded = views::dashboard_handler(State(state.clone()), Extension(user.clone()), all())
        .await
        .unwrap();
    assert!(!seeded.0.show_sample_data_action);
    assert_eq!(seeded.0.active_tasks.items.len(), 3);
    assert_eq!(seeded.0.today_schedule.items.len(), 2);
    assert_eq!(seeded.0.upcoming_deadlines.items.len(), 5);

    let high = views::dashboard_handler(
        State(state.clone()),
        Extension(user.clone()),
        ApiQuery(views::DashboardQuery {
            priority: Some("high".to_string()),
        }),
    )
    .await
    .unwrap();
    assert_eq!(high.0.priority_filter, PriorityFilter::High);
    assert!(!high.0.active_tasks.items.is_empty());
    assert!(high
        .0
        .active_tasks
        .items
        .iter()
        .all(|entry| entry.task.priority.as_str() == "high" && entry.subject.is_some()));
}

#[tokio::test]
async fn unknown_priority_filter_is_a_bad_request() {
    let state = memory_state(true);
    let user = guest(&state).await;

    let err = views::dashboard_handler(
        State(state.clone()),
        Extension(user),
        ApiQuery(views::DashboardQuery {
            priority: Some("urgent".to_string()),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn settings_are_validated_and_drive_the_pomodoro() {
    let state = memory_state(true);
    let user = guest(&state).await;

    let err = account::save_settings_handler(
        State(state.clone()),
        Extension(user.clone()),
        form(json!({
            "app": {"darkMode": true},
            "pomodoro": {"focusDuration": 200, "shortBreakDuration": 5, "longBreakDuration": 15, "sessionsBeforeLongBreak": 4}
        })),
    )
    .await
    .unwrap_err();
    let body = json_body(err.into_response()).await;
    assert!(body["fields"]["pomodoro.focusDuration"].is_array());

    let saved = account::save_settings_handler(
        State(state.clone()),
        Extension(user.clone()),
        form(json!({
            "app": {"darkMode": true},
            "pomodoro": {"focusDuration": 50, "shortBreakDuration": 10, "longBreakDuration": 30, "sessionsBeforeLongBreak": 2}
        })),
    )
    .await
    .unwrap();
    assert!(saved.0.dark_mode);
    assert!(saved.0.notifications);

    let plan = views::pomodoro_next_handler(
        State(state.clone()),
        Extension(user.clone()),
        ApiQuery(views::PomodoroQuery {
            completed: 2,
            current: PomodoroPhase::Focus,
        }),
    )
    .await
    .unwrap();
    assert_eq!(plan.0.phase, PomodoroPhase::LongBreak);
    assert_eq!(plan.0.minutes, 30);

    let plan = views::pomodoro_next_handler(
        State(state.clone()),
        Extension(user),
        ApiQuery(views::PomodoroQuery {
            completed: 2,
            current: PomodoroPhase::LongBreak,
        }),
    )
    .await
    .unwrap();
    assert_eq!(plan.0.phase, PomodoroPhase::Focus);
    assert_eq!(plan.0.minutes, 50);
}

#[tokio::test]
async fn profile_updates_are_validated() {
    let state = memory_state(true);
    let user = guest(&state).await;

    let err = account::update_profile_handler(
        State(state.clone()),
        Extension(user.clone()),
        form(json!({"username": "student", "email": "not-an-email"})),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let updated = account::update_profile_handler(
        State(state.clone()),
        Extension(user),
        form(json!({"username": "student", "email": "me@example.com", "firstName": "Sam"})),
    )
    .await
    .unwrap();
    assert_eq!(updated.0.email, "me@example.com");
    assert_eq!(updated.0.first_name, "Sam");
    assert_eq!(updated.0.last_name, "User");
}

#[tokio::test]
async fn unknown_pages_are_not_found() {
    let state = memory_state(true);
    let err = shell::client_shell_handler(State(state), Method::GET, Uri::from_static("/no-such-page"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Port(PortError::NotFound(_))));
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_pages_are_only_fetched() {
    let state = memory_state(true);
    let err = shell::client_shell_handler(State(state), Method::POST, Uri::from_static("/tasks"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}
