//! Request and response bodies shared by the server routes and the client.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Record, Snapshot};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_REGISTERED: &str = "registered";
pub const STATUS_LOGGED_IN: &str = "login successful";
pub const STATUS_NOT_FOUND: &str = "not found";
pub const CONFLICT_MESSAGE: &str = "Current or newer version found in database, please synchronize";
pub const INTERNAL_MESSAGE: &str = "internal error";

/// Status taxonomy carried by every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    InvalidArgument,
    Unauthenticated,
    NotFound,
    AlreadyExists,
    Internal,
}

impl Code {
    pub fn http_status(&self) -> u16 {
        match self {
            Code::InvalidArgument => 400,
            Code::Unauthenticated => 401,
            Code::NotFound => 404,
            Code::AlreadyExists => 409,
            Code::Internal => 500,
        }
    }

    /// Best guess for a response whose body could not be decoded.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Code::InvalidArgument,
            401 | 403 => Code::Unauthenticated,
            404 => Code::NotFound,
            409 => Code::AlreadyExists,
            _ => Code::Internal,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::InvalidArgument => "invalid argument",
            Code::Unauthenticated => "unauthenticated",
            Code::NotFound => "not found",
            Code::AlreadyExists => "already exists",
            Code::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: Code,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub pass: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    pub token: String,
    #[serde(default)]
    pub vault: Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultResponse {
    pub status: String,
    #[serde(default)]
    pub vault: Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse {
    pub status: String,
    pub record: Record,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
