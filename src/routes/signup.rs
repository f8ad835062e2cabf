//! Plan application routes
//!
//! - GET  /          plan form
//! - POST /apply     create a signing session, redirect to the service
//! - GET  /callback  finalize the session and show the outcome
//!
//! The nonce and session ID travel in cookies between /apply and /callback.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderMap, HeaderValue, HOST, LOCATION, SET_COOKIE};
use hyper::{Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{error_response, html_response};
use crate::pages;
use crate::server::AppState;
use crate::signing::{finalize_and_reconcile, CookieJar, TokenSlot, TokenStore};
use crate::types::{Result, SignupError};

#[derive(Debug, Deserialize)]
struct ApplyForm {
    #[serde(default)]
    plan: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    #[serde(default)]
    session_id: Option<String>,
}

/// GET /
pub fn handle_index(state: Arc<AppState>) -> Response<Full<Bytes>> {
    html_response(
        StatusCode::OK,
        pages::index_page(state.reconciler.translator().locale()),
    )
}

/// POST /apply
///
/// Form body: `plan=<label>`. On success, 302 to the signing service with
/// the nonce and session ID set as cookies.
pub async fn handle_apply(
    state: Arc<AppState>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response<Full<Bytes>> {
    match apply(&state, headers, &body).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Apply failed: {}", e);
            error_response(state.reconciler.translator(), &e)
        }
    }
}

async fn apply(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Response<Full<Bytes>>> {
    let translator = state.reconciler.translator();

    let form: ApplyForm = serde_urlencoded::from_bytes(body)?;
    let plan = form
        .plan
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| SignupError::BadRequest(translator.missing_plan().to_string()))?;

    let origin = request_origin(state, headers)?;
    let request = state
        .builder
        .build(&plan, &origin, chrono::Utc::now(), state.nonces.as_ref());
    let nonce = request
        .nonce()
        .ok_or_else(|| SignupError::Internal("session request has no nonce".to_string()))?
        .to_string();

    let session = state.client.create_session(&request).await?;
    info!(session_id = %session.id, plan = %plan, "Signing session created");

    let mut jar = CookieJar::from_headers(headers, state.args.cookie_secure);
    jar.set(TokenSlot::Nonce, nonce);
    jar.set(TokenSlot::SessionId, session.id);

    let location = HeaderValue::from_str(&session.redirect_url)
        .map_err(|e| SignupError::Internal(format!("Invalid redirect URL: {}", e)))?;

    let mut response = Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, location)
        .header("Cache-Control", "no-store")
        .body(Full::new(Bytes::new()))
        .map_err(|e| SignupError::Internal(e.to_string()))?;
    append_cookies(&mut response, &jar)?;

    Ok(response)
}

/// Origin the signing service should call back to
///
/// PUBLIC_URL when configured, otherwise the request Host with the scheme
/// taken from `X-Forwarded-Proto` (https when cookies are Secure).
fn request_origin(state: &AppState, headers: &HeaderMap) -> Result<String> {
    if let Some(public_url) = &state.args.public_url {
        return Ok(public_url.trim_end_matches('/').to_string());
    }

    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| SignupError::BadRequest("Missing Host header".to_string()))?;

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .map(|p| p.split(',').next().unwrap_or(p).trim().to_string())
        .filter(|p| p == "http" || p == "https")
        .unwrap_or_else(|| {
            if state.args.cookie_secure {
                "https".to_string()
            } else {
                "http".to_string()
            }
        });

    Ok(format!("{}://{}", scheme, host))
}

/// GET /callback
///
/// Both cookies are cleared whatever the outcome, so a nonce is good for
/// one callback only.
pub async fn handle_callback(
    state: Arc<AppState>,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let translator = state.reconciler.translator();
    let mut jar = CookieJar::from_headers(headers, state.args.cookie_secure);

    let query_session_id = if state.args.callback_with_session_id {
        query
            .and_then(|q| serde_urlencoded::from_str::<CallbackQuery>(q).ok())
            .and_then(|q| q.session_id)
    } else {
        None
    };
    debug!(from_query = query_session_id.is_some(), "Resolving session for callback");

    let outcome = finalize_and_reconcile(
        state.client.as_ref(),
        &jar,
        query_session_id.as_deref(),
        &state.reconciler,
    )
    .await;

    let mut response = match outcome {
        Ok(outcome) => html_response(
            StatusCode::OK,
            pages::outcome_page(translator.locale(), &outcome.content),
        ),
        Err(e) => error_response(translator, &SignupError::Reconcile(e)),
    };

    for slot in TokenSlot::ALL {
        jar.clear(slot);
    }
    if let Err(e) = append_cookies(&mut response, &jar) {
        warn!("Failed to clear cookies: {}", e);
    }

    response
}

fn append_cookies(response: &mut Response<Full<Bytes>>, jar: &CookieJar) -> Result<()> {
    for cookie in jar.set_cookie_headers() {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| SignupError::Internal(format!("Invalid cookie: {}", e)))?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(())
}
