//! Typed results for each operation and the response decoder.
//!
//! # Design
//! The result variant is picked from the operation, never from the payload,
//! so a `GetUserAvatar` always yields `OperationResult::GetAvatar`. Fields are
//! read leniently: a missing, null or non-string value becomes `""` and is
//! reported through `defects()` instead of failing the decode. Only bytes
//! that are not JSON (or not an object, for results that read fields) fail.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::operation::{Operation, OperationKind};

/// Substring an avatar URL must contain to point at the image host.
pub const AVATAR_DOMAIN_MARKER: &str = ".bg";

/// Suffix an avatar URL must end with.
pub const AVATAR_EXTENSION: &str = ".jpg";

/// A semantic problem in an otherwise decoded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentDefect {
    #[serde(rename = "missingToken")]
    MissingToken,
    #[serde(rename = "missingObjectId")]
    MissingObjectId,
    #[serde(rename = "missingEmail")]
    MissingEmail,
    #[serde(rename = "missingAvatarURL")]
    MissingAvatarUrl,
    #[serde(rename = "missingUsername")]
    MissingUsername,
    #[serde(rename = "badURLDomain")]
    BadUrlDomain,
    #[serde(rename = "badAvatarExtension")]
    BadAvatarExtension,
}

impl fmt::Display for ContentDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentDefect::MissingToken => "missingToken",
            ContentDefect::MissingObjectId => "missingObjectId",
            ContentDefect::MissingEmail => "missingEmail",
            ContentDefect::MissingAvatarUrl => "missingAvatarURL",
            ContentDefect::MissingUsername => "missingUsername",
            ContentDefect::BadUrlDomain => "badURLDomain",
            ContentDefect::BadAvatarExtension => "badAvatarExtension",
        };
        f.write_str(name)
    }
}

/// Reply to `Operation::Register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename = "objectId", default, deserialize_with = "lenient_string")]
    pub object_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub username: String,
}

impl RegistrationResult {
    pub fn defects(&self) -> Vec<ContentDefect> {
        let mut defects = Vec::new();
        if self.object_id.is_empty() {
            defects.push(ContentDefect::MissingObjectId);
        }
        if self.email.is_empty() {
            defects.push(ContentDefect::MissingEmail);
        }
        if self.username.is_empty() {
            defects.push(ContentDefect::MissingUsername);
        }
        defects
    }
}

/// Reply to `Operation::Login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    #[serde(rename = "user-token", default, deserialize_with = "lenient_string")]
    pub user_token: String,
    #[serde(rename = "objectId", default, deserialize_with = "lenient_string")]
    pub object_id: String,
}

impl LoginResult {
    pub fn defects(&self) -> Vec<ContentDefect> {
        let mut defects = Vec::new();
        if self.user_token.is_empty() {
            defects.push(ContentDefect::MissingToken);
        }
        if self.object_id.is_empty() {
            defects.push(ContentDefect::MissingObjectId);
        }
        defects
    }
}

/// Reply to `Operation::Logout`. Carries nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResult {}

/// Reply to `Operation::SetUserAvatar`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAvatarResult {
    #[serde(rename = "avatarURL", default, deserialize_with = "lenient_string")]
    pub avatar_url: String,
}

impl SetAvatarResult {
    pub fn defects(&self) -> Vec<ContentDefect> {
        avatar_defects(&self.avatar_url)
    }
}

/// Reply to `Operation::GetUserAvatar`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAvatarResult {
    #[serde(rename = "avatarURL", default, deserialize_with = "lenient_string")]
    pub avatar_url: String,
}

impl GetAvatarResult {
    pub fn defects(&self) -> Vec<ContentDefect> {
        avatar_defects(&self.avatar_url)
    }
}

fn avatar_defects(url: &str) -> Vec<ContentDefect> {
    let mut defects = Vec::new();
    if url.is_empty() {
        defects.push(ContentDefect::MissingAvatarUrl);
    }
    if !url.contains(AVATAR_DOMAIN_MARKER) {
        defects.push(ContentDefect::BadUrlDomain);
    }
    if !url.ends_with(AVATAR_EXTENSION) {
        defects.push(ContentDefect::BadAvatarExtension);
    }
    defects
}

/// The decoded reply to an operation, one variant per `OperationKind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Registration(RegistrationResult),
    Login(LoginResult),
    Logout(LogoutResult),
    SetAvatar(SetAvatarResult),
    GetAvatar(GetAvatarResult),
}

impl OperationResult {
    /// Decode `body` as the reply to `op`.
    pub fn decode(op: &Operation, body: &[u8]) -> Result<Self, ApiError> {
        match op {
            Operation::Register { .. } => read_object(body).map(OperationResult::Registration),
            Operation::Login { .. } => read_object(body).map(OperationResult::Login),
            Operation::Logout { .. } => {
                // Logout reads no fields; any JSON, or nothing at all, will do.
                if !body.iter().all(u8::is_ascii_whitespace) {
                    parse_json(body)?;
                }
                Ok(OperationResult::Logout(LogoutResult {}))
            }
            Operation::GetUserAvatar { .. } => read_object(body).map(OperationResult::GetAvatar),
            Operation::SetUserAvatar { .. } => read_object(body).map(OperationResult::SetAvatar),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            OperationResult::Registration(_) => OperationKind::Register,
            OperationResult::Login(_) => OperationKind::Login,
            OperationResult::Logout(_) => OperationKind::Logout,
            OperationResult::SetAvatar(_) => OperationKind::SetUserAvatar,
            OperationResult::GetAvatar(_) => OperationKind::GetUserAvatar,
        }
    }

    pub fn defects(&self) -> Vec<ContentDefect> {
        match self {
            OperationResult::Registration(result) => result.defects(),
            OperationResult::Login(result) => result.defects(),
            OperationResult::Logout(_) => Vec::new(),
            OperationResult::SetAvatar(result) => result.defects(),
            OperationResult::GetAvatar(result) => result.defects(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.defects().is_empty()
    }

    pub fn registration(&self) -> Option<&RegistrationResult> {
        match self {
            OperationResult::Registration(result) => Some(result),
            _ => None,
        }
    }

    pub fn login(&self) -> Option<&LoginResult> {
        match self {
            OperationResult::Login(result) => Some(result),
            _ => None,
        }
    }

    pub fn logout(&self) -> Option<&LogoutResult> {
        match self {
            OperationResult::Logout(result) => Some(result),
            _ => None,
        }
    }

    pub fn set_avatar(&self) -> Option<&SetAvatarResult> {
        match self {
            OperationResult::SetAvatar(result) => Some(result),
            _ => None,
        }
    }

    pub fn get_avatar(&self) -> Option<&GetAvatarResult> {
        match self {
            OperationResult::GetAvatar(result) => Some(result),
            _ => None,
        }
    }
}

/// Decode `body` as the reply to `op`. See `OperationResult::decode`.
pub fn decode(op: &Operation, body: &[u8]) -> Result<OperationResult, ApiError> {
    OperationResult::decode(op, body)
}

fn parse_json(body: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedJson(e.to_string()))
}

fn read_object<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let value = parse_json(body)?;
    if !value.is_object() {
        return Err(ApiError::MalformedJson(format!(
            "expected a JSON object, found {}",
            json_type(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| ApiError::MalformedJson(e.to_string()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}
