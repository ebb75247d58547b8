//! Item categories shared by shopping and pantry items.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DataModelError, optional_text, required_text};

/// `#RRGGBB` colour, stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn new(value: impl AsRef<str>) -> Result<Self, DataModelError> {
        let value = value.as_ref().trim();
        let valid = value
            .strip_prefix('#')
            .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(DataModelError::Invalid {
                field: "color",
                reason: "expected #RRGGBB",
            });
        }
        Ok(Self(value.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = DataModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Named category with a display colour and optional icon.
///
/// System categories are seeded by the service and are not edited by users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCategory {
    pub id: Uuid,
    name: String,
    pub color: HexColor,
    icon: Option<String>,
    is_system: bool,
}

impl ItemCategory {
    /// A user-defined category.
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError`] when the name or icon is empty or too long.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        color: HexColor,
        icon: Option<String>,
    ) -> Result<Self, DataModelError> {
        Ok(Self {
            id,
            name: required_text("name", name, 100)?,
            color,
            icon: optional_text("icon", icon, 50)?,
            is_system: false,
        })
    }

    /// A built-in category.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn system(
        id: Uuid,
        name: impl Into<String>,
        color: HexColor,
        icon: Option<String>,
    ) -> Result<Self, DataModelError> {
        let mut category = Self::new(id, name, color, icon)?;
        category.is_system = true;
        Ok(category)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }
}
