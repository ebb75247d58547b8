//! Port for the database that schema revisions are applied to.

use async_trait::async_trait;

use crate::domain::migrations::{LedgerEntry, PlannedStep};

use super::define_port_error;

define_port_error! {
    /// Errors raised while reading the ledger or applying a step.
    pub enum MigrationStoreError {
        /// Connection to the database failed.
        Connection { message: String } =>
            "migration store connection failed: {message}",
        /// Reading or creating the ledger failed.
        Ledger { message: String } =>
            "migration ledger query failed: {message}",
        /// A step's DDL or ledger insert failed and was rolled back.
        Step { revision: String, message: String } =>
            "revision {revision} failed: {message}",
    }
}

/// Storage for schema revisions and the append-only ledger.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Create the ledger table when it does not exist yet.
    async fn ensure_ledger(&self) -> Result<(), MigrationStoreError>;

    /// Ledger entries in insertion order.
    async fn load_ledger(&self) -> Result<Vec<LedgerEntry>, MigrationStoreError>;

    /// Run the step's statements and append its ledger entry atomically.
    ///
    /// Either both take effect or neither does.
    async fn apply_step(&self, step: &PlannedStep) -> Result<(), MigrationStoreError>;
}
