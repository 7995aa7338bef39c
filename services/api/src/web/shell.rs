//! services/api/src/web/shell.rs
//!
//! Serves the single-page client. Static assets come straight from the static
//! directory; any path the client router knows gets `index.html` so deep links
//! survive a reload. Everything else is a 404.

use axum::{
    extract::State,
    http::{Method, Uri},
    response::Html,
};
use std::sync::Arc;
use study_planner_core::ports::PortError;
use tracing::error;

use crate::error::ApiError;
use crate::web::state::AppState;

/// A page of the client application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRoute {
    Dashboard,
    Tasks,
    Schedule,
    Pomodoro,
    Subjects,
    Progress,
    Settings,
    Login,
    Register,
}

/// Which frame a page renders inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Centered card, no navigation.
    Auth,
    /// Sidebar and header around the page.
    App,
}

impl ClientRoute {
    pub const ALL: [ClientRoute; 9] = [
        ClientRoute::Dashboard,
        ClientRoute::Tasks,
        ClientRoute::Schedule,
        ClientRoute::Pomodoro,
        ClientRoute::Subjects,
        ClientRoute::Progress,
        ClientRoute::Settings,
        ClientRoute::Login,
        ClientRoute::Register,
    ];

    /// Matches a request path; a single trailing slash is ignored.
    pub fn parse(path: &str) -> Option<Self> {
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    pub fn path(&self) -> &'static str {
        match self {
            ClientRoute::Dashboard => "/",
            ClientRoute::Tasks => "/tasks",
            ClientRoute::Schedule => "/schedule",
            ClientRoute::Pomodoro => "/pomodoro",
            ClientRoute::Subjects => "/subjects",
            ClientRoute::Progress => "/progress",
            ClientRoute::Settings => "/settings",
            ClientRoute::Login => "/login",
            ClientRoute::Register => "/register",
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            ClientRoute::Login | ClientRoute::Register => Layout::Auth,
            _ => Layout::App,
        }
    }
}

/// Router fallback for requests no API route or static file matched. Pages are
/// only ever fetched, so other methods are a 404 like unknown paths.
pub async fn client_shell_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Result<Html<String>, ApiError> {
    let is_fetch = method == Method::GET || method == Method::HEAD;
    if !is_fetch || ClientRoute::parse(uri.path()).is_none() {
        return Err(PortError::NotFound(format!("Page {} not found", uri.path())).into());
    }
    let index = state.config.static_dir.join("index.html");
    let html = tokio::fs::read_to_string(&index).await.map_err(|e| {
        error!("Failed to read client shell {}: {:?}", index.display(), e);
        e
    })?;
    Ok(Html(html))
}
