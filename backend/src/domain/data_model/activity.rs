//! Append-only audit trail.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{DataModelError, required_text};

/// One recorded user action. `entity_type` and `action` are free-form tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    entity_type: String,
    pub entity_id: Option<Uuid>,
    action: String,
    pub meta_data: Value,
}

impl ActivityLog {
    /// # Errors
    ///
    /// Returns [`DataModelError`] when a tag is empty or longer than 50
    /// characters.
    pub fn record(
        id: Uuid,
        user_id: Uuid,
        entity_type: impl Into<String>,
        entity_id: Option<Uuid>,
        action: impl Into<String>,
    ) -> Result<Self, DataModelError> {
        Ok(Self {
            id,
            user_id,
            entity_type: required_text("entity_type", entity_type, 50)?,
            entity_id,
            action: required_text("action", action, 50)?,
            meta_data: Value::Object(serde_json::Map::new()),
        })
    }

    #[must_use]
    pub fn with_meta_data(mut self, meta_data: Value) -> Self {
        self.meta_data = meta_data;
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}
