//! Error types for the signup gateway

use hyper::StatusCode;

use crate::signing::ReconcileError;
use crate::stamp::RemoteError;

/// Main error type for signup gateway operations
#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Remote session service error: {0}")]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl SignupError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::Reconcile(e) => e.status_code(),
        }
    }
}

impl From<std::io::Error> for SignupError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_urlencoded::de::Error> for SignupError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        Self::BadRequest(format!("Invalid form data: {}", err))
    }
}

/// Result type alias for signup gateway operations
pub type Result<T> = std::result::Result<T, SignupError>;
