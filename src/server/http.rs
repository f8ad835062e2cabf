//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::routes;
use crate::signing::{NonceSource, OsNonceSource, Reconciler, SessionRequestBuilder};
use crate::stamp::SessionClient;
use crate::types::SignupError;

/// Largest accepted form body
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Remote signing session service
    pub client: Arc<dyn SessionClient>,
    /// Nonce generator for new sessions
    pub nonces: Arc<dyn NonceSource>,
    /// Builds CreateSession requests from the configured flags
    pub builder: SessionRequestBuilder,
    /// Turns finalize results into the outcome text
    pub reconciler: Reconciler,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, client: Arc<dyn SessionClient>) -> Result<Self, SignupError> {
        let builder = args.session_builder()?;
        let reconciler = Reconciler::new(args.translator());
        Ok(Self {
            args,
            client,
            nonces: Arc::new(OsNonceSource),
            builder,
            reconciler,
            started_at: Instant::now(),
        })
    }

    /// Replace the nonce generator
    pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), SignupError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Stamp signup listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - signing service token is optional");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    info!("[{}] {} {}", addr, parts.method, path);

    let response = match (parts.method, path.as_str()) {
        (Method::GET, "/") => routes::handle_index(Arc::clone(&state)),

        (Method::POST, "/apply") => {
            let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    warn!("[{}] Failed to read body: {}", addr, e);
                    return Ok(routes::error_response(
                        state.reconciler.translator(),
                        &SignupError::Http(format!("Failed to read body: {}", e)),
                    ));
                }
            };
            routes::handle_apply(Arc::clone(&state), &parts.headers, bytes).await
        }

        (Method::GET, "/callback") => {
            routes::handle_callback(Arc::clone(&state), &parts.headers, parts.uri.query()).await
        }

        // Liveness
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        (_, p) => routes::not_found_response(state.reconciler.translator(), p),
    };

    Ok(response)
}
