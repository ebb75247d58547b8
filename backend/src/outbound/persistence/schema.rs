//! Diesel table definitions owned by the persistence adapter.
//!
//! Application tables are described by the migration chain and created from
//! rendered DDL; only the ledger is queried through Diesel.

diesel::table! {
    /// Append-only record of applied migration steps.
    migration_ledger (id) {
        id -> Int8,
        revision -> Varchar,
        /// `upgrade` or `downgrade`.
        direction -> Varchar,
        /// SHA-256 hex of the revision's upgrade statements.
        checksum -> Varchar,
        applied_at -> Timestamptz,
    }
}
