//! Stamp signup - plan application signed with a My Number card
//!
//! A small web gateway: the user picks a plan, signs the application form
//! with the JPKI signing certificate on a remote signing service, and
//! optionally consents to sharing their latest personal information. The
//! gateway never handles keys; it only creates the session, checks the
//! callback belongs to the browser that started it, and explains the result.
//!
//! ## Modules
//!
//! - **signing**: session requests, nonce check, result reconciliation, messages
//! - **stamp**: client for the remote session service
//! - **routes** / **pages** / **server**: the HTTP surface

pub mod config;
pub mod pages;
pub mod routes;
pub mod server;
pub mod signing;
pub mod stamp;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, SignupError};
