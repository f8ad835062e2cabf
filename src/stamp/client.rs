//! Connect-protocol JSON client for the session service
//!
//! Unary Connect calls are plain HTTP POSTs to
//! `{base}/{package.Service}/{Method}` with a JSON body. Failures come back
//! as a non-2xx status and a JSON error object whose `details` may include a
//! `google.rpc.ErrorInfo`.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use prost::Message as _;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{RemoteError, SessionClient};
use crate::signing::result::{ErrorInfo, FinalizeResult, ERROR_INFO_TYPE};
use crate::signing::session::{CreateSessionRequest, CreateSessionResponse};

/// Fully qualified service name
pub const SESSION_SERVICE: &str = "pocketsign.stamp.v1.SessionService";

/// Configuration for the session client
#[derive(Debug, Clone)]
pub struct SessionClientConfig {
    /// Service base URL (e.g. https://verify.mock.p8n.app)
    pub base_url: String,
    /// Bearer token sent as `Authorization` on every call
    pub token: Option<String>,
    /// Timeout for HTTP requests (default: 30 seconds)
    pub request_timeout: Duration,
}

impl Default for SessionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://verify.mock.p8n.app".to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP implementation of [`SessionClient`]
pub struct HttpSessionClient {
    config: SessionClientConfig,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct FinalizeSessionRequest<'a> {
    id: &'a str,
}

impl HttpSessionClient {
    pub fn new(config: SessionClientConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("stamp-signup/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            SESSION_SERVICE,
            method
        )
    }

    async fn call<Req, Resp>(&self, method: &str, body: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.method_url(method);
        debug!(url = %url, "Calling session service");

        let mut request = self
            .http_client
            .post(&url)
            .header("Connect-Protocol-Version", "1")
            .json(body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let error = parse_connect_error(status, &bytes);
            warn!(method, status = %status, reason = ?error.reason(), "Session service call failed");
            return Err(error);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| RemoteError::Transport(format!("invalid {} response: {}", method, e)))
    }
}

#[async_trait::async_trait]
impl SessionClient for HttpSessionClient {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, RemoteError> {
        self.call("CreateSession", request).await
    }

    async fn finalize_session(&self, session_id: &str) -> Result<FinalizeResult, RemoteError> {
        self.call("FinalizeSession", &FinalizeSessionRequest { id: session_id })
            .await
    }
}

// ============================================================================
// Connect error decoding
// ============================================================================

#[derive(Deserialize)]
struct ConnectErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ConnectErrorDetail>,
}

#[derive(Deserialize)]
struct ConnectErrorDetail {
    #[serde(rename = "type", default)]
    type_name: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    debug: Option<serde_json::Value>,
}

impl ConnectErrorDetail {
    fn error_info(&self) -> Option<ErrorInfo> {
        if self.type_name != ERROR_INFO_TYPE {
            return None;
        }

        // Prefer the JSON debug form when the server includes it
        if let Some(reason) = self
            .debug
            .as_ref()
            .and_then(|d| d.get("reason"))
            .and_then(|r| r.as_str())
        {
            let domain = self
                .debug
                .as_ref()
                .and_then(|d| d.get("domain"))
                .and_then(|d| d.as_str())
                .unwrap_or_default();
            return Some(ErrorInfo {
                reason: reason.to_string(),
                domain: domain.to_string(),
            });
        }

        let bytes = STANDARD_NO_PAD
            .decode(self.value.trim_end_matches('='))
            .ok()?;
        decode_error_info(&bytes)
    }
}

/// Build a [`RemoteError`] from a non-2xx Connect response
pub fn parse_connect_error(status: StatusCode, body: &[u8]) -> RemoteError {
    match serde_json::from_slice::<ConnectErrorBody>(body) {
        Ok(parsed) => RemoteError::Protocol {
            code: if parsed.code.is_empty() {
                code_for_status(status).to_string()
            } else {
                parsed.code
            },
            message: parsed.message,
            error_info: parsed.details.iter().find_map(ConnectErrorDetail::error_info),
        },
        Err(_) => RemoteError::Protocol {
            code: code_for_status(status).to_string(),
            message: String::from_utf8_lossy(body).trim().to_string(),
            error_info: None,
        },
    }
}

/// Connect code implied by an HTTP status when the body carries none
fn code_for_status(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "internal",
        401 => "unauthenticated",
        403 => "permission_denied",
        404 => "unimplemented",
        429 | 502 | 503 | 504 => "unavailable",
        _ => "unknown",
    }
}

/// Wire form of `google.rpc.ErrorInfo`; the metadata map (field 3) is skipped
#[derive(Clone, PartialEq, prost::Message)]
struct ErrorInfoProto {
    #[prost(string, tag = "1")]
    reason: String,
    #[prost(string, tag = "2")]
    domain: String,
}

/// Decode a binary `google.rpc.ErrorInfo`
pub fn decode_error_info(bytes: &[u8]) -> Option<ErrorInfo> {
    let proto = ErrorInfoProto::decode(bytes).ok()?;
    Some(ErrorInfo {
        reason: proto.reason,
        domain: proto.domain,
    })
}
