//! Failure taxonomy for backend calls.

use paydesk_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend rejected the session (HTTP 401).
    #[error("session expired")]
    AuthExpired,

    /// The requested record does not exist (HTTP 404 or an empty result).
    #[error("not found")]
    NotFound,

    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// Any other non-success response.
    #[error("backend error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Backend { status: u16, message: Option<String> },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Text shown to the admin: the backend's own message when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Backend {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::Validation(message) => message.clone(),
            ApiError::Domain(DomainError::Validation(message)) => message.clone(),
            ApiError::AuthExpired => "Session expired, please log in again".to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Whether the caller should treat this as "nothing stored yet".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::NotFound | ApiError::Backend { status: 404, .. }
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
