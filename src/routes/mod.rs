//! HTTP routes for the signup gateway

pub mod health;
pub mod signup;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::pages;
use crate::signing::{remote_failure_message, Translator};
use crate::types::SignupError;

pub use health::{health_check, version_info};
pub use signup::{handle_apply, handle_callback, handle_index};

/// HTML page response
pub fn html_response(status: StatusCode, html: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Cache-Control", "no-store")
        .body(Full::new(Bytes::from(html)))
        .unwrap()
}

/// Error page for a failed request, with the status the error maps to
pub fn error_response(translator: &Translator, err: &SignupError) -> Response<Full<Bytes>> {
    let message = match err {
        SignupError::BadRequest(message) => message.clone(),
        SignupError::Remote(e) => remote_failure_message(e, translator),
        SignupError::Reconcile(e) => e.user_message(translator),
        other => translator.unknown_error_with_detail(&other.to_string()),
    };
    html_response(
        err.status_code(),
        pages::error_page(translator.locale(), &message),
    )
}

/// Not found page
pub fn not_found_response(translator: &Translator, path: &str) -> Response<Full<Bytes>> {
    html_response(
        StatusCode::NOT_FOUND,
        pages::error_page(translator.locale(), &format!("404 Not Found: {}", path)),
    )
}
