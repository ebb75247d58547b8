//! Per-user display and notification preferences.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{CurrencyCode, DataModelError, TableRow, required_text, uuid_value};
use crate::domain::constraints::Row;

text_enum! {
    /// Colour scheme preference.
    pub enum Theme ("theme") {
        Light => "light",
        Dark => "dark",
        System => "system",
    }
}

text_enum! {
    /// Who can see a user's profile.
    pub enum ProfileVisibility ("profile_visibility") {
        Public => "public",
        Friends => "friends",
        Private => "private",
    }
}

/// Notification switches stored in the `notification_settings` document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub push_enabled: bool,
    pub email_enabled: bool,
    pub list_updates: bool,
    pub reminders: bool,
    pub social_updates: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            push_enabled: true,
            email_enabled: true,
            list_updates: true,
            reminders: true,
            social_updates: true,
        }
    }
}

/// Privacy switches stored in the `privacy_settings` document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    pub show_online_status: bool,
    pub allow_friend_requests: bool,
    pub show_shared_lists: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::Friends,
            show_online_status: true,
            allow_friend_requests: true,
            show_shared_lists: true,
        }
    }
}

/// One preferences record per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPreferences {
    pub id: Uuid,
    pub user_id: Uuid,
    pub theme: Theme,
    language: String,
    pub currency: CurrencyCode,
    pub notification_settings: NotificationSettings,
    pub privacy_settings: PrivacySettings,
}

impl UserPreferences {
    /// Defaults matching the column defaults of `user_preferences`.
    pub fn defaults_for(id: Uuid, user_id: Uuid) -> Self {
        Self {
            id,
            user_id,
            theme: Theme::System,
            language: "en".to_owned(),
            currency: CurrencyCode::usd(),
            notification_settings: NotificationSettings::default(),
            privacy_settings: PrivacySettings::default(),
        }
    }

    /// Set the language tag (at most ten characters, e.g. `pt-BR`).
    ///
    /// # Errors
    ///
    /// Returns [`DataModelError`] for empty or over-long tags.
    pub fn set_language(&mut self, language: impl Into<String>) -> Result<(), DataModelError> {
        self.language = required_text("language", language, 10)?;
        Ok(())
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl TableRow for UserPreferences {
    const TABLE: &'static str = "user_preferences";

    fn to_row(&self) -> Row {
        Row::from([
            ("id".to_owned(), uuid_value(self.id)),
            ("user_id".to_owned(), uuid_value(self.user_id)),
            ("theme".to_owned(), Value::from(self.theme.as_str())),
            ("language".to_owned(), Value::from(self.language.as_str())),
            ("currency".to_owned(), Value::from(self.currency.as_str())),
            (
                "notification_settings".to_owned(),
                serde_json::to_value(self.notification_settings).unwrap_or(Value::Null),
            ),
            (
                "privacy_settings".to_owned(),
                serde_json::to_value(self.privacy_settings).unwrap_or(Value::Null),
            ),
        ])
    }
}
