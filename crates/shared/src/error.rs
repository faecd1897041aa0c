use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unreachable,
    Timeout,
    MalformedResponse,
    NotConnected,
    Busy,
    Backend,
    InvalidAddress,
    SurfaceUnavailable,
    Validation,
    Internal,
}

/// JSON error body returned by the miner backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Tagged failure of a command bridge operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("backend call timed out")]
    Timeout,
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
    #[error("relay is not connected")]
    NotConnected,
    #[error("another relay operation is still in progress")]
    Busy,
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid relay address: {0}")]
    InvalidAddress(String),
    #[error("surface unavailable: {0}")]
    SurfaceUnavailable(String),
}

impl BridgeError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unreachable(_) => ErrorCode::Unreachable,
            Self::Timeout => ErrorCode::Timeout,
            Self::MalformedResponse(_) => ErrorCode::MalformedResponse,
            Self::NotConnected => ErrorCode::NotConnected,
            Self::Busy => ErrorCode::Busy,
            Self::Backend(_) => ErrorCode::Backend,
            Self::InvalidAddress(_) => ErrorCode::InvalidAddress,
            Self::SurfaceUnavailable(_) => ErrorCode::SurfaceUnavailable,
        }
    }
}

impl From<BridgeError> for ApiError {
    fn from(value: BridgeError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}
