//! The closed set of backend operations.
//!
//! # Design
//! `Operation` is the single description of a backend call. The compiler,
//! validator and decoder all `match` on it exhaustively, so adding a variant
//! is a compile error everywhere a mapping is missing.

use serde::{Deserialize, Serialize};

/// One backend call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Operation {
    Register {
        email: String,
        password: String,
        username: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout {
        access_token: String,
    },
    GetUserAvatar {
        object_id: String,
        access_token: String,
    },
    SetUserAvatar {
        object_id: String,
        access_token: String,
        avatar_url: String,
    },
}

/// Discriminant shared by `Operation` and `OperationResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Register,
    Login,
    Logout,
    GetUserAvatar,
    SetUserAvatar,
}

impl Operation {
    pub fn register(
        email: impl Into<String>,
        password: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Operation::Register {
            email: email.into(),
            password: password.into(),
            username: username.into(),
        }
    }

    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Operation::Login {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn logout(access_token: impl Into<String>) -> Self {
        Operation::Logout {
            access_token: access_token.into(),
        }
    }

    pub fn get_user_avatar(object_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Operation::GetUserAvatar {
            object_id: object_id.into(),
            access_token: access_token.into(),
        }
    }

    pub fn set_user_avatar(
        object_id: impl Into<String>,
        access_token: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Operation::SetUserAvatar {
            object_id: object_id.into(),
            access_token: access_token.into(),
            avatar_url: avatar_url.into(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Register { .. } => OperationKind::Register,
            Operation::Login { .. } => OperationKind::Login,
            Operation::Logout { .. } => OperationKind::Logout,
            Operation::GetUserAvatar { .. } => OperationKind::GetUserAvatar,
            Operation::SetUserAvatar { .. } => OperationKind::SetUserAvatar,
        }
    }
}
