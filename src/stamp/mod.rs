//! Remote signing session service
//!
//! The external service owns the session: it collects the signature and the
//! consent from the user and hands back a structured result once. This
//! module is the narrow boundary the rest of the gateway talks through.
//!
//! - [`SessionClient`]: create / finalize capability (mockable)
//! - [`HttpSessionClient`]: Connect-protocol JSON implementation over reqwest
//! - [`RemoteError`]: transport or protocol failure, optionally with `ErrorInfo`

pub mod client;

use crate::signing::result::{ErrorInfo, FinalizeResult};
use crate::signing::session::{CreateSessionRequest, CreateSessionResponse};

pub use client::{HttpSessionClient, SessionClientConfig};

/// Failure of a remote call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a protocol answer (network, TLS, timeout, bad body)
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a Connect error
    #[error("{code}: {message}")]
    Protocol {
        code: String,
        message: String,
        error_info: Option<ErrorInfo>,
    },
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl RemoteError {
    /// Session lifecycle reason code, if the service supplied one
    pub fn reason(&self) -> Option<&str> {
        match self {
            RemoteError::Protocol {
                error_info: Some(info),
                ..
            } => info.reason(),
            _ => None,
        }
    }
}

/// Create / finalize operations of the remote service
///
/// Neither call is retried. Finalize is expected at most once per session;
/// a repeat surfaces whatever error the service reports.
#[async_trait::async_trait]
pub trait SessionClient: Send + Sync {
    /// Register a new session, returning its ID and the URL to send the user to
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, RemoteError>;

    /// Close a session and collect its results
    async fn finalize_session(&self, session_id: &str) -> Result<FinalizeResult, RemoteError>;
}
