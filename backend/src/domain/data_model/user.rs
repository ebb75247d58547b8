//! Account holder.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{DataModelError, TableRow, required_text, uuid_value};
use crate::domain::constraints::Row;

/// Maximum stored length of a phone number.
pub const PHONE_MAX: usize = 15;
/// Maximum stored length of a dialling prefix such as `+44`.
pub const COUNTRY_CODE_MAX: usize = 4;

/// Login email, unique across users and stored lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl AsRef<str>) -> Result<Self, DataModelError> {
        let email = required_text("email", email.as_ref().trim(), 255)?;
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            return Err(DataModelError::Invalid {
                field: "email",
                reason: "expected local@domain",
            });
        }
        Ok(Self(email.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = DataModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Application user.
///
/// ## Invariants
/// - `email` is unique.
/// - `(phone, country_code)` is unique; the same phone number may exist
///   under different country codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    id: Uuid,
    email: Email,
    phone: String,
    country_code: String,
    name: String,
    avatar_url: Option<String>,
    password_hash: String,
    is_active: bool,
}

impl User {
    /// Validate and build an active user.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError`] when a field is empty, too long or
    /// malformed.
    pub fn new(
        id: Uuid,
        email: Email,
        phone: impl Into<String>,
        country_code: impl Into<String>,
        name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<Self, DataModelError> {
        let phone = required_text("phone", phone, PHONE_MAX)?;
        if !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(DataModelError::Invalid {
                field: "phone",
                reason: "expected digits only",
            });
        }
        let country_code = required_text("country_code", country_code, COUNTRY_CODE_MAX)?;
        let digits = country_code.strip_prefix('+').unwrap_or(&country_code);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DataModelError::Invalid {
                field: "country_code",
                reason: "expected a dialling prefix such as +44",
            });
        }
        Ok(Self {
            id,
            email,
            phone,
            country_code,
            name: required_text("name", name, 255)?,
            avatar_url: None,
            password_hash: required_text("password_hash", password_hash, 255)?,
            is_active: true,
        })
    }

    #[must_use]
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

impl TableRow for User {
    const TABLE: &'static str = "users";

    fn to_row(&self) -> Row {
        Row::from([
            ("id".to_owned(), uuid_value(self.id)),
            ("email".to_owned(), Value::from(self.email.as_str())),
            ("phone".to_owned(), Value::from(self.phone.as_str())),
            ("country_code".to_owned(), Value::from(self.country_code.as_str())),
            ("name".to_owned(), Value::from(self.name.as_str())),
            ("avatar_url".to_owned(), Value::from(self.avatar_url.clone())),
            ("password_hash".to_owned(), Value::from(self.password_hash.as_str())),
            ("is_active".to_owned(), Value::Bool(self.is_active)),
        ])
    }
}
