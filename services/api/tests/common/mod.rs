//! Shared fixtures for the api integration tests.
#![allow(dead_code)]

use api_lib::adapters::MemoryAdapter;
use api_lib::config::Config;
use api_lib::web::AppState;
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use study_planner_core::domain::{CurrentUser, NewUser};
use study_planner_core::ports::DatabaseService;

/// Holds the `index.html` the client shell serves in tests.
pub const CLIENT_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/client");

/// An app state over a fresh in-memory store.
pub fn memory_state(guest_access: bool) -> Arc<AppState> {
    let env: HashMap<&str, String> = HashMap::from([
        ("STORAGE_BACKEND", "memory".to_string()),
        ("GUEST_ACCESS", guest_access.to_string()),
        ("STATIC_DIR", CLIENT_DIR.to_string()),
    ]);
    let config = Config::from_lookup(|key: &str| env.get(key).cloned()).unwrap();
    Arc::new(AppState::new(Arc::new(MemoryAdapter::new()), Arc::new(config)))
}

/// Inserts a user straight into the store, bypassing password hashing.
pub async fn add_user(db: &dyn DatabaseService, username: &str) -> CurrentUser {
    let user = db
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            hashed_password: "not-a-real-hash".to_string(),
        })
        .await
        .unwrap();
    CurrentUser {
        id: user.id,
        username: user.username,
    }
}

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Turns a Set-Cookie header from a login into the Cookie header of a follow-up request.
pub fn cookie_headers(response: &Response<Body>) -> HeaderMap {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap().to_string();
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(&pair).unwrap());
    headers
}
