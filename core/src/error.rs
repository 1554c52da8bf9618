//! Error types for the account API client.
//!
//! # Design
//! `ApiError` covers everything that can go wrong for a single operation:
//! compiling the request, moving it over the wire, and decoding the reply.
//! A chain hands these to the step handler instead of bailing out, so every
//! variant carries a human-readable description through `Display`.
//!
//! Field-level validation failures and content defects are not errors; they
//! are reported as data (`ValidationReport`, `ContentDefect`).

use thiserror::Error;

use crate::chain::ChainState;

/// Errors produced while compiling, sending or decoding one operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The base URL and operation path do not form a valid request URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The transporter could not complete the round-trip.
    #[error("transport failed: {0}")]
    TransportError(String),

    /// The server answered with a status other than 200.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body is not JSON, or not the JSON shape the operation reads.
    #[error("malformed JSON: {0}")]
    MalformedJson(String),
}

impl ApiError {
    /// True for failures raised before anything was sent.
    pub fn is_compile_error(&self) -> bool {
        matches!(self, ApiError::InvalidUrl(_) | ApiError::SerializationError(_))
    }
}

/// Misuse of a `ChainExecutor`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain executor is {0:?}; call reset() before starting again")]
    NotIdle(ChainState),
}
