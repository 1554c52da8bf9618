//! Stateless request compiler and response parser for the account API.
//!
//! # Design
//! `AccountClient` holds only a `base_url` and carries no mutable state between
//! calls. `compile` turns an `Operation` into an `HttpRequest`; `parse` turns
//! the matching `HttpResponse` into an `OperationResult`. The caller (or a
//! `Transporter`) executes the HTTP round-trip in between.

use std::collections::BTreeMap;

use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::operation::Operation;
use crate::result::OperationResult;

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const USER_TOKEN_HEADER: &str = "user-token";

/// Properties requested when reading a user's avatar.
const AVATAR_PROPS: &str = "props=avatarURL,avatarRotation";

/// The only status the backend uses for success.
const STATUS_OK: u16 = 200;

/// Synchronous, stateless client for the account API.
#[derive(Debug, Clone)]
pub struct AccountClient {
    base_url: String,
}

impl AccountClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Compile `op` into a transport-ready request.
    ///
    /// Equal operations always compile to equal requests. Fails only when the
    /// base URL cannot carry the operation path or the body cannot be encoded.
    pub fn compile(&self, op: &Operation) -> Result<HttpRequest, ApiError> {
        let request = match op {
            Operation::Register {
                email,
                password,
                username,
            } => HttpRequest {
                method: HttpMethod::Post,
                path: self.url(&["users", "register"], None)?,
                headers: json_headers(None),
                body: Some(json_body(&[
                    ("email", email),
                    ("password", password),
                    ("username", username),
                ])?),
            },
            Operation::Login { email, password } => HttpRequest {
                method: HttpMethod::Post,
                path: self.url(&["users", "login"], None)?,
                headers: json_headers(None),
                body: Some(json_body(&[("login", email), ("password", password)])?),
            },
            Operation::Logout { access_token } => HttpRequest {
                method: HttpMethod::Get,
                path: self.url(&["users", "logout"], None)?,
                headers: json_headers(Some(access_token)),
                body: None,
            },
            // Content-Type only: the access token is not sent for avatar reads.
            Operation::GetUserAvatar { object_id, .. } => HttpRequest {
                method: HttpMethod::Get,
                path: self.url(&["users", object_id.as_str()], Some(AVATAR_PROPS))?,
                headers: json_headers(None),
                body: None,
            },
            Operation::SetUserAvatar {
                object_id,
                access_token,
                avatar_url,
            } => HttpRequest {
                method: HttpMethod::Put,
                path: self.url(&["users", object_id.as_str()], None)?,
                headers: json_headers(Some(access_token)),
                body: Some(json_body(&[("avatarURL", avatar_url)])?),
            },
        };
        debug!(method = %request.method, path = %request.path, "compiled request");
        Ok(request)
    }

    /// Parse the response to `op`. Anything but 200 is an `HttpError`.
    pub fn parse(&self, op: &Operation, response: HttpResponse) -> Result<OperationResult, ApiError> {
        check_status(&response, STATUS_OK)?;
        OperationResult::decode(op, &response.body)
    }

    fn url(&self, segments: &[&str], query: Option<&str>) -> Result<String, ApiError> {
        // `Url` resolves dot segments instead of escaping them.
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(ApiError::InvalidUrl(format!("path segment {dot:?} is not allowed")));
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        url.set_query(query);
        Ok(url.into())
    }
}

fn json_headers(access_token: Option<&String>) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(CONTENT_TYPE_HEADER.to_string(), CONTENT_TYPE_JSON.to_string());
    if let Some(token) = access_token {
        headers.insert(USER_TOKEN_HEADER.to_string(), token.clone());
    }
    headers
}

fn json_body(fields: &[(&str, &String)]) -> Result<String, ApiError> {
    let body: BTreeMap<&str, &str> = fields.iter().map(|(key, value)| (*key, value.as_str())).collect();
    serde_json::to_string(&body).map_err(|e| ApiError::SerializationError(e.to_string()))
}

/// Map a status other than `expected` to `ApiError::HttpError`.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body_text(),
    })
}
