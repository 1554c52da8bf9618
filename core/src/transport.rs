//! The network boundary.
//!
//! The core never performs I/O itself. A `Transporter` receives a compiled
//! `HttpRequest` and returns the raw `HttpResponse`; retries, timeouts and
//! connection reuse are its own business. Timeouts should surface as
//! `ApiError::TransportError`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::AccountClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::operation::Operation;
use crate::result::OperationResult;

/// Executes one HTTP round-trip.
#[async_trait]
pub trait Transporter: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transporter + ?Sized> Transporter for Arc<T> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transporter + ?Sized> Transporter for Box<T> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request).await
    }
}

/// Compile, send and parse a single operation outside of a chain.
pub async fn execute<T>(
    client: &AccountClient,
    transporter: &T,
    op: &Operation,
) -> Result<OperationResult, ApiError>
where
    T: Transporter + ?Sized,
{
    let request = client.compile(op)?;
    let response = transporter.send(&request).await?;
    client.parse(op, response)
}
