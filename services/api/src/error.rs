//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use crate::config::ConfigError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use study_planner_core::ports::PortError;
use study_planner_core::validation::field_messages;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the storage port.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A submitted form failed its field constraints.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The request could not be read, e.g. broken JSON or an unknown filter value.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The body was valid JSON of the wrong shape, e.g. an unknown priority.
    #[error("Unprocessable body: {0}")]
    Unprocessable(String),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from running the database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    /// Field-scoped messages, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Port(PortError::Invalid(_))
            | ApiError::Validation(_)
            | ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Port(PortError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client; only meaningful for 4xx errors.
    fn client_message(&self) -> String {
        match self {
            ApiError::Port(
                PortError::NotFound(msg) | PortError::Conflict(msg) | PortError::Invalid(msg),
            ) => msg.clone(),
            ApiError::Port(e) => e.to_string(),
            ApiError::BadRequest(msg) | ApiError::Unprocessable(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::Unprocessable(e.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => ErrorBody {
                error: "Validation failed".to_string(),
                fields: Some(field_messages(errors)),
            },
            ApiError::Port(PortError::Unauthorized) => ErrorBody {
                error: "Unauthorized".to_string(),
                fields: None,
            },
            _ if status.is_server_error() => {
                // Internal details go to the log, not to the client.
                error!("Request failed: {:?}", self);
                ErrorBody {
                    error: "Internal server error".to_string(),
                    fields: None,
                }
            }
            _ => ErrorBody {
                error: self.client_message(),
                fields: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_statuses() {
        let cases = [
            (PortError::NotFound("Task 1 not found".into()), StatusCode::NOT_FOUND),
            (PortError::Conflict("name taken".into()), StatusCode::CONFLICT),
            (PortError::Invalid("bad subject".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (PortError::Unauthorized, StatusCode::UNAUTHORIZED),
            (PortError::Unexpected("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn port_errors_render_without_the_wrapper_text() {
        let response = ApiError::from(PortError::NotFound("Subject 1 not found".into())).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Subject 1 not found");
        assert!(body.get("fields").is_none());
    }

    #[test]
    fn wrongly_shaped_json_is_unprocessable() {
        assert_eq!(
            ApiError::Unprocessable("unknown variant `urgent`".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn bad_request_is_a_client_error() {
        assert_eq!(
            ApiError::BadRequest("unknown priority".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
