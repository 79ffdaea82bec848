//! Server error type mapped onto the status taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::guard::GuardError;
use super::storage::StorageError;
use crate::api::{Code, ErrorBody, CONFLICT_MESSAGE, INTERNAL_MESSAGE};

#[derive(Debug)]
pub enum ApiError {
    InvalidArgument(String),
    Unauthenticated(String),
    NotFound(String),
    AlreadyExists(String),
    /// Detail is logged server-side and never sent to the caller.
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> Code {
        match self {
            Self::InvalidArgument(_) => Code::InvalidArgument,
            Self::Unauthenticated(_) => Code::Unauthenticated,
            Self::NotFound(_) => Code::NotFound,
            Self::AlreadyExists(_) => Code::AlreadyExists,
            Self::Internal(_) => Code::Internal,
        }
    }

    pub fn unauthenticated(message: &str) -> Self {
        Self::Unauthenticated(message.to_string())
    }

    fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
            Self::InvalidArgument(m)
            | Self::Unauthenticated(m)
            | Self::NotFound(m)
            | Self::AlreadyExists(m) => m.clone(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
            Self::Unauthenticated(e) => write!(f, "Unauthenticated: {}", e),
            Self::NotFound(e) => write!(f, "Not found: {}", e),
            Self::AlreadyExists(e) => write!(f, "Already exists: {}", e),
            Self::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            tracing::error!("Request failed: {}", detail);
        }

        let code = self.code();
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            code,
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::LoginTaken(login) => {
                Self::AlreadyExists(format!("login '{}' is already registered", login))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<GuardError> for ApiError {
    fn from(e: GuardError) -> Self {
        match e {
            GuardError::Invalid(message) => Self::InvalidArgument(message),
            GuardError::Conflict { .. } => Self::AlreadyExists(CONFLICT_MESSAGE.to_string()),
            GuardError::NotFound => Self::NotFound(crate::api::STATUS_NOT_FOUND.to_string()),
            GuardError::Storage(e) => e.into(),
        }
    }
}
