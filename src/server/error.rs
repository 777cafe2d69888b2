use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::engine::engine::EngineError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    SessionNotFound,
    InvalidRequest,
    WorkflowUnavailable,
    WorkflowFailed,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug)]
pub struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    pub fn session_not_found(session_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new(
                ErrorCode::SessionNotFound,
                "session does not exist",
                Some(format!("session_id={session_id}")),
            ),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidRequest, message, None),
        }
    }
}

impl From<EngineError> for HttpApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MissingContext => Self::invalid_request(err.to_string()),
            EngineError::WorkflowsDisabled => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: ApiError::new(ErrorCode::WorkflowUnavailable, err.to_string(), None),
            },
            EngineError::NoEvent | EngineError::Workflow(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                error: ApiError::new(
                    ErrorCode::WorkflowFailed,
                    "event generation failed",
                    Some(err.to_string()),
                ),
            },
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
