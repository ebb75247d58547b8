//! The pantry schema revision chain.

use super::{Migration, tables};
use crate::domain::schema::SchemaChange;

/// All revisions, oldest first.
pub fn all() -> Vec<Migration> {
    vec![
        create_initial_schema(),
        country_code_placeholder(),
        fix_security_settings(),
        fix_user_preferences(),
    ]
}

fn create_initial_schema() -> Migration {
    let tables = tables::initial_tables();
    let downgrade = tables
        .iter()
        .rev()
        .map(|table| SchemaChange::drop_table(&table.name))
        .collect();
    Migration {
        revision: "00000000",
        down_revision: None,
        message: "create initial schema",
        upgrade: tables.into_iter().map(SchemaChange::CreateTable).collect(),
        downgrade,
    }
}

/// Kept for chain continuity; `users.country_code` already ships in
/// `00000000`.
fn country_code_placeholder() -> Migration {
    Migration {
        revision: "9bab74c6397d",
        down_revision: Some("00000000"),
        message: "add country code field and make phone required",
        upgrade: Vec::new(),
        downgrade: Vec::new(),
    }
}

/// Rebuilds `security_settings` and `biometric_keys`.
///
/// `biometric_keys` references `security_settings`, so it is dropped first
/// and recreated last.
fn fix_security_settings() -> Migration {
    Migration {
        revision: "00000001",
        down_revision: Some("9bab74c6397d"),
        message: "fix security settings schema",
        upgrade: vec![
            SchemaChange::drop_table("biometric_keys"),
            SchemaChange::drop_table("security_settings"),
            SchemaChange::CreateTable(tables::security_settings()),
            SchemaChange::CreateTable(tables::biometric_keys()),
        ],
        // Recreates the superseded shapes rather than the ones `00000000`
        // created; rows in either table are lost.
        downgrade: vec![
            SchemaChange::drop_table("biometric_keys"),
            SchemaChange::drop_table("security_settings"),
            SchemaChange::CreateTable(tables::security_settings_legacy()),
            SchemaChange::CreateTable(tables::biometric_keys_legacy()),
        ],
    }
}

fn fix_user_preferences() -> Migration {
    Migration {
        revision: "00000002",
        down_revision: Some("00000001"),
        message: "fix user preferences schema",
        upgrade: vec![
            SchemaChange::drop_table("user_preferences"),
            SchemaChange::CreateTable(tables::user_preferences()),
        ],
        downgrade: vec![
            SchemaChange::drop_table("user_preferences"),
            SchemaChange::CreateTable(tables::user_preferences_flat()),
        ],
    }
}
