//! Request orchestration core for the account API.
//!
//! # Overview
//! Describes the five account operations (register, login, logout, get and
//! set avatar) as data, compiles them into `HttpRequest` values, decodes
//! replies into typed results, and runs dependent operations in sequence.
//! The network round-trip is delegated to a `Transporter` (host-does-IO).
//!
//! # Design
//! - `Operation` and `OperationResult` are closed enums; every mapping between
//!   them is an exhaustive `match`.
//! - `AccountClient` is stateless: it holds only `base_url`.
//! - Validation and content defects are reported as data, never as errors.
//! - `ChainExecutor` runs one operation at a time and threads an owned
//!   context through its step handlers.

pub mod chain;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod operation;
pub mod result;
pub mod transport;
pub mod validate;

pub use chain::{ChainExecutor, ChainReport, ChainState, Chainer, Flow, StepOutcome};
pub use client::AccountClient;
pub use config::{load_config, ClientConfig, ConfigError};
pub use error::{ApiError, ChainError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operation::{Operation, OperationKind};
pub use result::{
    ContentDefect, GetAvatarResult, LoginResult, LogoutResult, OperationResult, RegistrationResult,
    SetAvatarResult,
};
pub use transport::{execute, Transporter};
pub use validate::{validate, Field, ValidationReport};
