//! Session and biometric security settings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{DataModelError, TableRow, required_text, uuid_value};
use crate::domain::constraints::Row;

/// Default idle session timeout in seconds.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u32 = 1800;
/// Default number of concurrent sessions.
pub const DEFAULT_MAX_SESSIONS: u32 = 5;

/// One security settings record per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecuritySettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub biometric_enabled: bool,
    pub login_alerts: bool,
    session_timeout: u32,
    max_sessions: u32,
}

impl SecuritySettings {
    pub fn defaults_for(id: Uuid, user_id: Uuid) -> Self {
        Self {
            id,
            user_id,
            biometric_enabled: false,
            login_alerts: true,
            session_timeout: DEFAULT_SESSION_TIMEOUT_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    /// # Errors
    ///
    /// Returns [`DataModelError::NotPositive`] for zero.
    pub fn set_session_timeout(&mut self, seconds: u32) -> Result<(), DataModelError> {
        self.session_timeout = positive("session_timeout", seconds)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DataModelError::NotPositive`] for zero.
    pub fn set_max_sessions(&mut self, sessions: u32) -> Result<(), DataModelError> {
        self.max_sessions = positive("max_sessions", sessions)?;
        Ok(())
    }

    pub fn session_timeout(&self) -> u32 {
        self.session_timeout
    }

    pub fn max_sessions(&self) -> u32 {
        self.max_sessions
    }
}

fn positive(field: &'static str, value: u32) -> Result<u32, DataModelError> {
    if value == 0 {
        return Err(DataModelError::NotPositive { field });
    }
    Ok(value)
}

impl TableRow for SecuritySettings {
    const TABLE: &'static str = "security_settings";

    fn to_row(&self) -> Row {
        Row::from([
            ("id".to_owned(), uuid_value(self.id)),
            ("user_id".to_owned(), uuid_value(self.user_id)),
            ("biometric_enabled".to_owned(), Value::Bool(self.biometric_enabled)),
            ("login_alerts".to_owned(), Value::Bool(self.login_alerts)),
            ("session_timeout".to_owned(), Value::from(self.session_timeout)),
            ("max_sessions".to_owned(), Value::from(self.max_sessions)),
        ])
    }
}

/// A device public key registered against a user's security settings.
///
/// Deactivating a key keeps the row; `is_active` is independent of deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiometricKey {
    pub id: Uuid,
    pub security_settings_id: Uuid,
    device_id: String,
    public_key: String,
    key_type: String,
    is_active: bool,
    last_used_at: Option<DateTime<Utc>>,
}

impl BiometricKey {
    /// # Errors
    ///
    /// Returns [`DataModelError`] when the device id or public key is empty
    /// or the device id exceeds 255 characters.
    pub fn new(
        id: Uuid,
        security_settings_id: Uuid,
        device_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Result<Self, DataModelError> {
        Ok(Self {
            id,
            security_settings_id,
            device_id: required_text("device_id", device_id, 255)?,
            public_key: required_text("public_key", public_key, usize::MAX)?,
            key_type: "biometric".to_owned(),
            is_active: true,
            last_used_at: None,
        })
    }

    pub fn record_use(&mut self, at: DateTime<Utc>) {
        self.last_used_at = Some(at);
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }
}
