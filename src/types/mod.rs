//! Shared types for the signup gateway

pub mod error;

pub use error::{Result, SignupError};
