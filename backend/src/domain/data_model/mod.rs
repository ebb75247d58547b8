//! Pantry entities.
//!
//! Constructors enforce the rules the schema cannot express on its own
//! (positive quantities, enumerated statuses, currency codes, canonical
//! friend pairs). Each entity that is persisted through [`TableRow`] renders
//! itself as a row so the in-memory constraint checks in
//! [`crate::domain::constraints`] can be run against it.

/// Declare a string-backed enumeration stored in a `VARCHAR` column.
macro_rules! text_enum {
    (
        $(#[$outer:meta])*
        pub enum $name:ident ($field:literal) {
            $( $(#[$variant_meta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$variant_meta])* $variant ),+
        }

        impl $name {
            /// Stored spelling.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::data_model::DataModelError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $( $text => Ok(Self::$variant), )+
                    other => Err($crate::domain::data_model::DataModelError::UnknownVariant {
                        field: $field,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

mod activity;
mod category;
mod pantry;
mod preferences;
mod security;
mod shopping;
mod social;
mod user;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::constraints::Row;

pub use activity::ActivityLog;
pub use category::{HexColor, ItemCategory};
pub use pantry::PantryItem;
pub use preferences::{
    NotificationSettings, PrivacySettings, ProfileVisibility, Theme, UserPreferences,
};
pub use security::{BiometricKey, SecuritySettings};
pub use shopping::{
    CollaboratorStatus, ListCollaborator, ListStatus, PermissionLevel, ShoppingItem,
    ShoppingList,
};
pub use social::{FriendPair, FriendRequest, FriendRequestStatus, Friendship, FriendshipStatus};
pub use user::{Email, User};

/// Validation failures raised by entity constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataModelError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} is not valid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("unknown {field} `{value}`")]
    UnknownVariant { field: &'static str, value: String },
    #[error("a user cannot befriend or invite themselves")]
    SelfRelation,
}

/// Entities stored as one row of a schema table.
pub trait TableRow {
    /// Table the entity lives in.
    const TABLE: &'static str;

    /// Column values keyed by column name.
    fn to_row(&self) -> Row;
}

pub(crate) fn required_text(
    field: &'static str,
    value: impl Into<String>,
    max: usize,
) -> Result<String, DataModelError> {
    let value = value.into();
    if value.trim().is_empty() {
        return Err(DataModelError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(DataModelError::TooLong { field, max });
    }
    Ok(value)
}

pub(crate) fn optional_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, DataModelError> {
    value.map(|value| required_text(field, value, max)).transpose()
}

pub(crate) fn uuid_value(id: Uuid) -> serde_json::Value {
    serde_json::Value::String(id.to_string())
}

/// Three-letter ISO 4217 style currency code, stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validate and normalise a currency code.
    pub fn new(code: impl AsRef<str>) -> Result<Self, DataModelError> {
        let code = code.as_ref().trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DataModelError::Invalid {
                field: "currency",
                reason: "expected a three-letter code",
            });
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn usd() -> Self {
        Self("USD".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::usd()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = DataModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Amount of an item. Zero is allowed; see [`Quantity::positive`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Quantity(f64);

impl Quantity {
    /// A finite, non-negative quantity.
    pub fn new(field: &'static str, value: f64) -> Result<Self, DataModelError> {
        if !value.is_finite() {
            return Err(DataModelError::Invalid {
                field,
                reason: "expected a finite number",
            });
        }
        if value < 0.0 {
            return Err(DataModelError::Negative { field });
        }
        Ok(Self(value))
    }

    /// A finite quantity strictly greater than zero.
    pub fn positive(field: &'static str, value: f64) -> Result<Self, DataModelError> {
        let quantity = Self::new(field, value)?;
        if quantity.0 <= 0.0 {
            return Err(DataModelError::NotPositive { field });
        }
        Ok(quantity)
    }

    pub const fn one() -> Self {
        Self(1.0)
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl From<Quantity> for f64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl TryFrom<f64> for Quantity {
    type Error = DataModelError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new("quantity", value)
    }
}

#[cfg(test)]
mod tests;
