//! Router-level tests: requests go through `api_lib::web::router` with
//! `tower::ServiceExt::oneshot`, so routing, auth layering, extractor
//! rejections and the client-shell fallback are all on the path.

mod common;

use api_lib::web::router;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use common::{json_body, memory_state};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn send_raw(app: &Router, method: Method, uri: &str, raw: &'static str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(raw))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

fn session_pair(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Asserts a JSON error body and returns it.
async fn error_body(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"), "got {}", content_type);
    let body = json_body(response).await;
    assert!(body["error"].is_string(), "no error message in {}", body);
    body
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn protected_routes_need_a_session_without_guest_access() {
    let app = router(memory_state(false));

    let body = error_body(send(&app, Method::GET, "/api/tasks", None, None).await, StatusCode::UNAUTHORIZED).await;
    assert_eq!(body["error"], "Unauthorized");

    let response = send(&app, Method::GET, "/api/auth/me", Some("session=made-up"), None).await;
    error_body(response, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn the_session_cookie_carries_across_requests() {
    let app = router(memory_state(false));

    let register = json!({
        "username": "ada",
        "email": "ada@example.com",
        "password": "secret1",
        "confirmPassword": "secret1"
    });
    let response = send(&app, Method::POST, "/api/auth/register", None, Some(register)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_pair(&response);

    let me = send(&app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(json_body(me).await["username"], "ada");

    let logout = send(&app, Method::POST, "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let after = send(&app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
    error_body(after, StatusCode::UNAUTHORIZED).await;
}

#[tokio::test]
async fn registering_the_demo_name_does_not_capture_guests() {
    let app = router(memory_state(true));

    let register = json!({
        "username": "student",
        "email": "someone@example.com",
        "password": "secret1",
        "confirmPassword": "secret1"
    });
    let response = send(&app, Method::POST, "/api/auth/register", None, Some(register)).await;
    error_body(response, StatusCode::CONFLICT).await;

    let me = send(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(json_body(me).await["email"], "student@example.com");
}

//=========================================================================================
// Client Shell
//=========================================================================================

#[tokio::test]
async fn client_pages_get_the_shell_and_unknown_paths_a_json_404() {
    let app = router(memory_state(true));

    let page = send(&app, Method::GET, "/tasks", None, None).await;
    assert_eq!(page.status(), StatusCode::OK);
    let html = to_bytes(page.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&html).contains("<div id=\"root\"></div>"));

    error_body(send(&app, Method::GET, "/nope", None, None).await, StatusCode::NOT_FOUND).await;
    error_body(send(&app, Method::GET, "/api/nope", None, None).await, StatusCode::NOT_FOUND).await;
    error_body(send(&app, Method::POST, "/api/nope", None, Some(json!({}))).await, StatusCode::NOT_FOUND).await;
}

//=========================================================================================
// Extractor Rejections
//=========================================================================================

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = router(memory_state(true));

    let broken = send_raw(&app, Method::POST, "/api/tasks", "{\"title\": ").await;
    error_body(broken, StatusCode::BAD_REQUEST).await;

    let urgent = json!({"title": "Essay", "priority": "urgent"});
    let response = send(&app, Method::POST, "/api/tasks", None, Some(urgent)).await;
    error_body(response, StatusCode::UNPROCESSABLE_ENTITY).await;

    let response = send(&app, Method::GET, "/api/tasks/abc", None, None).await;
    error_body(response, StatusCode::BAD_REQUEST).await;

    let response = send(&app, Method::GET, "/api/pomodoro/next?current=nap", None, None).await;
    error_body(response, StatusCode::BAD_REQUEST).await;

    let response = send(&app, Method::GET, "/api/dashboard?priority=urgent", None, None).await;
    error_body(response, StatusCode::BAD_REQUEST).await;
}

//=========================================================================================
// Tasks
//=========================================================================================

#[tokio::test]
async fn tasks_can_be_replaced_and_patched() {
    let app = router(memory_state(true));

    let create = json!({"title": "Essay", "priority": "low", "estimatedTime": 30});
    let response = send(&app, Method::POST, "/api/tasks", None, Some(create)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = json_body(response).await["id"].as_i64().unwrap();
    let uri = format!("/api/tasks/{}", id);

    let replace = json!({"title": "Final essay", "priority": "high", "dueDate": "2026-11-02"});
    let response = send(&app, Method::PUT, &uri, None, Some(replace)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let replaced = json_body(response).await;
    assert_eq!(replaced["title"], "Final essay");
    assert_eq!(replaced["priority"], "high");
    assert_eq!(replaced["dueDate"], "2026-11-02");
    assert!(replaced["estimatedTime"].is_null());

    let response = send(&app, Method::PATCH, &uri, None, Some(json!({"completed": true}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let patched = json_body(response).await;
    assert_eq!(patched["completed"], true);
    assert_eq!(patched["title"], "Final essay");

    let response = send(&app, Method::PUT, &uri, None, Some(json!({"title": "", "priority": "low"}))).await;
    let body = error_body(response, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert!(body["fields"]["title"].is_array());

    let response = send(&app, Method::DELETE, &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    error_body(send(&app, Method::GET, &uri, None, None).await, StatusCode::NOT_FOUND).await;
}
