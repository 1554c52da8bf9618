//! Per-field input validation for operations.
//!
//! Validation is advisory: it never blocks `compile`, and callers decide what
//! to do with a failing field.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::operation::Operation;

const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,64}$")
        .expect("email pattern is a valid regex")
});

/// The operation arguments that carry validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Email,
    Password,
    Username,
    AccessToken,
    ObjectId,
    AvatarUrl,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Email => "email",
            Field::Password => "password",
            Field::Username => "username",
            Field::AccessToken => "accessToken",
            Field::ObjectId => "objectId",
            Field::AvatarUrl => "avatarUrl",
        };
        f.write_str(name)
    }
}

/// Pass/fail per field. Fields the operation does not carry are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    fields: BTreeMap<Field, bool>,
}

impl ValidationReport {
    /// `Some(passed)` for fields the operation carries, `None` otherwise.
    pub fn get(&self, field: Field) -> Option<bool> {
        self.fields.get(&field).copied()
    }

    pub fn is_valid(&self) -> bool {
        self.fields.values().all(|passed| *passed)
    }

    /// Failing fields in `Field` order.
    pub fn failures(&self) -> Vec<Field> {
        self.iter()
            .filter(|(_, passed)| !passed)
            .map(|(field, _)| field)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, bool)> + '_ {
        self.fields.iter().map(|(field, passed)| (*field, *passed))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn check(&mut self, field: Field, value: &str) {
        self.fields.insert(field, validate_field(field, value));
    }
}

/// Validate every field carried by `op`.
pub fn validate(op: &Operation) -> ValidationReport {
    let mut report = ValidationReport::default();
    match op {
        Operation::Register {
            email,
            password,
            username,
        } => {
            report.check(Field::Email, email);
            report.check(Field::Password, password);
            report.check(Field::Username, username);
        }
        Operation::Login { email, password } => {
            report.check(Field::Email, email);
            report.check(Field::Password, password);
        }
        Operation::Logout { access_token } => {
            report.check(Field::AccessToken, access_token);
        }
        Operation::GetUserAvatar {
            object_id,
            access_token,
        } => {
            report.check(Field::ObjectId, object_id);
            report.check(Field::AccessToken, access_token);
        }
        Operation::SetUserAvatar {
            object_id,
            access_token,
            avatar_url,
        } => {
            report.check(Field::ObjectId, object_id);
            report.check(Field::AccessToken, access_token);
            report.check(Field::AvatarUrl, avatar_url);
        }
    }
    report
}

/// Apply the rule for `field` to a single value.
pub fn validate_field(field: Field, value: &str) -> bool {
    match field {
        Field::Email => EMAIL_RE.is_match(value),
        Field::Password => value.chars().count() >= MIN_PASSWORD_LEN,
        Field::Username | Field::AccessToken | Field::ObjectId | Field::AvatarUrl => !value.is_empty(),
    }
}

impl Operation {
    pub fn validate(&self) -> ValidationReport {
        validate(self)
    }
}
