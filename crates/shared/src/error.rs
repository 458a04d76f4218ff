use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    Internal,
    /// 2xx response whose envelope carried `success: false`.
    Rejected,
    Unexpected,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorCode::BadRequest,
            404 => ErrorCode::NotFound,
            500..=599 => ErrorCode::Internal,
            _ => ErrorCode::Unexpected,
        }
    }
}

/// Failure reported by the catalog backend, either through a non-2xx status
/// or through a `{success: false, error}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: None,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, message: Option<String>) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status: Some(status),
            message: message.unwrap_or_else(|| format!("HTTP error! status: {status}")),
        }
    }

    pub fn rejected(message: Option<String>) -> Self {
        Self::new(
            ErrorCode::Rejected,
            message.unwrap_or_else(|| "request failed".to_string()),
        )
    }
}

/// Client-side input problems caught before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a search query")]
    EmptyQuery,
    #[error("result count must be at least 1")]
    InvalidTopK,
    #[error("unknown search method '{0}'")]
    UnknownSearchMethod(String),
    #[error("page must be at least 1 (got {0})")]
    PageOutOfRange(i64),
    #[error("Please fill in all required fields")]
    MissingRequiredFields,
}
