//! Remote JPKI signing and consent sessions
//!
//! The gateway never sees a private key. It asks the remote signing service
//! for a session, sends the user there, and interprets the result when the
//! user comes back.
//!
//! # Flow
//!
//! ```text
//!  Browser                 Gateway                       Signing service
//!     │  POST /apply (plan)   │                                 │
//!     │──────────────────────▶│  CreateSession(nonce in meta)   │
//!     │                       │────────────────────────────────▶│
//!     │                       │◀──────────── id, redirectUrl ───│
//!     │◀── 302 + cookies ─────│                                 │
//!     │         (nonce, session_id)                             │
//!     │──────────────── sign with My Number card ──────────────▶│
//!     │◀─────────────────── redirect to /callback ──────────────│
//!     │  GET /callback        │                                 │
//!     │──────────────────────▶│  FinalizeSession(id)            │
//!     │                       │────────────────────────────────▶│
//!     │                       │◀──────── metadata + results ────│
//!     │                       │  nonce check, interpret items   │
//!     │◀── outcome page ──────│                                 │
//! ```
//!
//! # Security Model
//!
//! - The nonce binds the callback to the browser that started the session
//! - A missing or mismatched nonce aborts before any item is interpreted
//! - The nonce is never logged

pub mod messages;
pub mod nonce;
pub mod reasons;
pub mod reconcile;
pub mod result;
pub mod session;
pub mod store;

pub use messages::{display_offset, Locale, Translator};
pub use nonce::{NonceSource, OsNonceSource};
pub use reconcile::{finalize_and_reconcile, remote_failure_message, Outcome, ReconcileError, Reconciler};
pub use result::FinalizeResult;
pub use session::{CreateSessionRequest, CreateSessionResponse, SessionRequestBuilder};
pub use store::{CookieJar, MemoryTokenStore, TokenSlot, TokenStore};
