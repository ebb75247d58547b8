//! Diesel row structs for the ledger table.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::migration_ledger;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = migration_ledger)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LedgerRow {
    pub revision: String,
    pub direction: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = migration_ledger)]
pub(crate) struct NewLedgerRow<'a> {
    pub revision: &'a str,
    pub direction: &'a str,
    pub checksum: &'a str,
}
