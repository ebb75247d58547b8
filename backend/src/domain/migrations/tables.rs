//! Table definitions used by the revision chain.
//!
//! Superseded shapes are kept so downgrades can recreate them.

use serde_json::json;

use crate::domain::schema::{
    CheckRule, ColumnDefault, ColumnDefinition, ColumnType, Constraint, TableDefinition,
};

fn id() -> ColumnDefinition {
    ColumnDefinition::new("id", ColumnType::Uuid).primary_key()
}

fn foreign_key(name: &str, table: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Uuid)
        .not_null()
        .references(table, "id")
}

fn optional_foreign_key(name: &str, table: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Uuid).references(table, "id")
}

fn timestamp_now(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::TimestampTz).default_value(ColumnDefault::Now)
}

fn optional_timestamp(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::TimestampTz)
}

fn required_varchar(name: &str, length: u16) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::varchar(length)).not_null()
}

fn optional_varchar(name: &str, length: u16) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::varchar(length))
}

fn text_with_default(name: &str, length: u16, value: &str) -> ColumnDefinition {
    required_varchar(name, length).default_value(ColumnDefault::Text(value.to_owned()))
}

fn flag(name: &str, value: bool) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Boolean)
        .not_null()
        .default_value(ColumnDefault::Bool(value))
}

fn integer(name: &str, value: i64) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Integer)
        .not_null()
        .default_value(ColumnDefault::Int(value))
}

fn quantity(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::numeric(10, 3))
        .not_null()
        .default_value(ColumnDefault::Decimal("1".to_owned()))
}

fn money(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::numeric(10, 2))
}

fn optional_currency(name: &str) -> ColumnDefinition {
    optional_varchar(name, 3).default_value(ColumnDefault::Text("USD".to_owned()))
}

fn text(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Text)
}

fn json_document(name: &str, value: serde_json::Value) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::Jsonb).default_value(ColumnDefault::Json(value))
}

fn with_timestamps(table: TableDefinition) -> TableDefinition {
    table
        .column(timestamp_now("created_at"))
        .column(timestamp_now("updated_at"))
}

pub(crate) fn users() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("users")
            .column(id())
            .column(required_varchar("email", 255).unique().indexed())
            .column(required_varchar("phone", 15))
            .column(required_varchar("country_code", 4))
            .column(required_varchar("name", 255))
            .column(text("avatar_url"))
            .column(required_varchar("password_hash", 255))
            .column(flag("is_active", true)),
    )
    .constraint(Constraint::unique(
        "unique_phone_per_country",
        ["phone", "country_code"],
    ))
}

/// Flat-boolean preferences created by the initial revision.
pub(crate) fn user_preferences_flat() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("user_preferences")
            .column(id())
            .column(foreign_key("user_id", "users").unique())
            .column(text_with_default("language", 10, "en"))
            .column(text_with_default("currency", 3, "USD"))
            .column(flag("notifications_enabled", true))
            .column(flag("email_notifications", true))
            .column(flag("push_notifications", true)),
    )
}

/// Preferences with a theme and JSON settings documents.
pub(crate) fn user_preferences() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("user_preferences")
            .column(id())
            .column(foreign_key("user_id", "users").unique())
            .column(text_with_default("theme", 20, "system"))
            .column(text_with_default("language", 10, "en"))
            .column(text_with_default("currency", 3, "USD"))
            .column(json_document(
                "notification_settings",
                json!({
                    "push_enabled": true,
                    "email_enabled": true,
                    "list_updates": true,
                    "reminders": true,
                    "social_updates": true
                }),
            ))
            .column(json_document(
                "privacy_settings",
                json!({
                    "profile_visibility": "friends",
                    "show_online_status": true,
                    "allow_friend_requests": true,
                    "show_shared_lists": true
                }),
            )),
    )
}

pub(crate) fn security_settings() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("security_settings")
            .column(id())
            .column(foreign_key("user_id", "users").unique())
            .column(flag("biometric_enabled", false))
            .column(flag("login_alerts", true))
            .column(integer("session_timeout", 1800))
            .column(integer("max_sessions", 5)),
    )
}

/// Superseded security settings, recreated only by downgrading `00000001`.
pub(crate) fn security_settings_legacy() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("security_settings")
            .column(id())
            .column(foreign_key("user_id", "users").unique())
            .column(flag("biometric_enabled", false))
            .column(integer("session_timeout_minutes", 30))
            .column(flag("auto_lock_enabled", true)),
    )
}

pub(crate) fn biometric_keys() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("biometric_keys")
            .column(id())
            .column(foreign_key("security_settings_id", "security_settings"))
            .column(required_varchar("device_id", 255))
            .column(text("public_key").not_null())
            .column(text_with_default("key_type", 50, "biometric"))
            .column(flag("is_active", true))
            .column(optional_timestamp("last_used_at")),
    )
}

/// Superseded biometric keys owned directly by a user.
pub(crate) fn biometric_keys_legacy() -> TableDefinition {
    TableDefinition::new("biometric_keys")
        .column(id())
        .column(foreign_key("user_id", "users"))
        .column(required_varchar("device_id", 255))
        .column(required_varchar("key_hash", 255))
        .column(required_varchar("key_type", 50))
        .column(flag("is_active", true))
        .column(timestamp_now("created_at"))
        .column(optional_timestamp("last_used_at"))
}

pub(crate) fn item_categories() -> TableDefinition {
    TableDefinition::new("item_categories")
        .column(id())
        .column(required_varchar("name", 100).unique().indexed())
        .column(required_varchar("color", 7))
        .column(optional_varchar("icon", 50))
        .column(flag("is_system", false))
        .column(timestamp_now("created_at"))
}

pub(crate) fn shopping_lists() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("shopping_lists")
            .column(id())
            .column(required_varchar("name", 255))
            .column(text("description"))
            .column(foreign_key("owner_id", "users"))
            .column(text_with_default("status", 20, "active"))
            .column(money("budget_amount"))
            .column(optional_currency("budget_currency"))
            .column(json_document("meta_data", json!({}))),
    )
}

pub(crate) fn shopping_items() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("shopping_items")
            .column(id())
            .column(foreign_key("shopping_list_id", "shopping_lists"))
            .column(required_varchar("name", 255))
            .column(optional_foreign_key("category_id", "item_categories"))
            .column(quantity("quantity"))
            .column(text_with_default("unit", 50, "pcs"))
            .column(money("estimated_price"))
            .column(money("actual_price"))
            .column(optional_currency("currency"))
            .column(text("notes"))
            .column(flag("is_completed", false))
            .column(optional_timestamp("completed_at"))
            .column(optional_foreign_key("assigned_user_id", "users"))
            .column(optional_varchar("barcode", 50))
            .column(text("image_url")),
    )
}

pub(crate) fn list_collaborators() -> TableDefinition {
    TableDefinition::new("list_collaborators")
        .column(id())
        .column(foreign_key("shopping_list_id", "shopping_lists"))
        .column(foreign_key("user_id", "users"))
        .column(text_with_default("permission_level", 20, "editor"))
        .column(timestamp_now("invited_at"))
        .column(optional_timestamp("joined_at"))
        .column(text_with_default("status", 20, "pending"))
        .constraint(Constraint::unique(
            "unique_list_collaborator",
            ["shopping_list_id", "user_id"],
        ))
}

pub(crate) fn friendships() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("friendships")
            .column(id())
            .column(foreign_key("user1_id", "users"))
            .column(foreign_key("user2_id", "users"))
            .column(text_with_default("status", 20, "active")),
    )
    .constraint(Constraint::unique(
        "unique_friendship",
        ["user1_id", "user2_id"],
    ))
    .constraint(Constraint::check(
        "no_self_friendship",
        CheckRule::columns_differ("user1_id", "user2_id"),
    ))
}

pub(crate) fn friend_requests() -> TableDefinition {
    TableDefinition::new("friend_requests")
        .column(id())
        .column(foreign_key("from_user_id", "users"))
        .column(foreign_key("to_user_id", "users"))
        .column(text("message"))
        .column(text_with_default("status", 20, "pending"))
        .column(timestamp_now("created_at"))
        .column(optional_timestamp("responded_at"))
        .constraint(Constraint::unique(
            "unique_friend_request",
            ["from_user_id", "to_user_id"],
        ))
        .constraint(Constraint::check(
            "no_self_friend_request",
            CheckRule::columns_differ("from_user_id", "to_user_id"),
        ))
}

pub(crate) fn pantry_items() -> TableDefinition {
    with_timestamps(
        TableDefinition::new("pantry_items")
            .column(id())
            .column(foreign_key("user_id", "users"))
            .column(required_varchar("name", 255))
            .column(optional_foreign_key("category_id", "item_categories"))
            .column(quantity("quantity"))
            .column(text_with_default("unit", 50, "pcs"))
            .column(optional_varchar("location", 100))
            .column(ColumnDefinition::new("expiration_date", ColumnType::Date))
            .column(quantity("low_stock_threshold"))
            .column(optional_varchar("barcode", 50))
            .column(text("image_url")),
    )
}

pub(crate) fn activity_logs() -> TableDefinition {
    TableDefinition::new("activity_logs")
        .column(id())
        .column(foreign_key("user_id", "users"))
        .column(required_varchar("entity_type", 50))
        .column(ColumnDefinition::new("entity_id", ColumnType::Uuid))
        .column(required_varchar("action", 50))
        .column(json_document("meta_data", json!({})))
        .column(timestamp_now("created_at"))
}

/// Tables created by the initial revision, in creation order.
pub(crate) fn initial_tables() -> Vec<TableDefinition> {
    vec![
        users(),
        user_preferences_flat(),
        security_settings(),
        biometric_keys(),
        item_categories(),
        shopping_lists(),
        shopping_items(),
        list_collaborators(),
        friendships(),
        friend_requests(),
        pantry_items(),
        activity_logs(),
    ]
}
