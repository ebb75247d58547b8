//! PostgreSQL-backed [`MigrationStore`].
//!
//! Every step runs inside one transaction together with its ledger insert.
//! PostgreSQL DDL is transactional, so a failing statement leaves neither
//! schema changes nor a ledger row behind.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl, SimpleAsyncConnection as _};
use tracing::debug;

use crate::domain::migrations::{Direction, LedgerEntry, PlannedStep};
use crate::domain::ports::{MigrationStore, MigrationStoreError};

use super::models::{LedgerRow, NewLedgerRow};
use super::pool::{DbPool, PoolError};
use super::schema::migration_ledger;

const CREATE_LEDGER_SQL: &str = "CREATE TABLE IF NOT EXISTS migration_ledger (
    id BIGSERIAL PRIMARY KEY,
    revision VARCHAR(64) NOT NULL,
    direction VARCHAR(16) NOT NULL CHECK (direction IN ('upgrade', 'downgrade')),
    checksum VARCHAR(64) NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// Diesel-backed migration store.
#[derive(Clone)]
pub struct DieselMigrationStore {
    pool: DbPool,
}

impl DieselMigrationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MigrationStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            MigrationStoreError::connection(message)
        }
    }
}

fn row_to_entry(row: LedgerRow) -> Result<LedgerEntry, MigrationStoreError> {
    let direction: Direction = row.direction.parse().map_err(|err| {
        MigrationStoreError::ledger(format!("row for {}: {err}", row.revision))
    })?;
    Ok(LedgerEntry {
        revision: row.revision,
        direction,
        checksum: row.checksum,
        applied_at: row.applied_at,
    })
}

#[async_trait]
impl MigrationStore for DieselMigrationStore {
    async fn ensure_ledger(&self) -> Result<(), MigrationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.batch_execute(CREATE_LEDGER_SQL)
            .await
            .map_err(|err| MigrationStoreError::ledger(err.to_string()))
    }

    async fn load_ledger(&self) -> Result<Vec<LedgerEntry>, MigrationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LedgerRow> = migration_ledger::table
            .select(LedgerRow::as_select())
            .order_by(migration_ledger::id)
            .load(&mut conn)
            .await
            .map_err(|err| MigrationStoreError::ledger(err.to_string()))?;
        rows.into_iter().map(row_to_entry).collect()
    }

    async fn apply_step(&self, step: &PlannedStep) -> Result<(), MigrationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let record = NewLedgerRow {
            revision: &step.revision,
            direction: step.direction.as_str(),
            checksum: &step.checksum,
        };

        conn.transaction(|conn| {
            async move {
                for statement in &step.statements {
                    debug!(revision = %step.revision, %statement, "executing");
                    conn.batch_execute(statement).await?;
                }
                diesel::insert_into(migration_ledger::table)
                    .values(&record)
                    .execute(conn)
                    .await?;
                Ok::<(), diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| MigrationStoreError::step(&step.revision, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    fn row(direction: &str) -> LedgerRow {
        LedgerRow {
            revision: "00000000".into(),
            direction: direction.into(),
            checksum: "ab".repeat(32),
            applied_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("upgrade", Direction::Upgrade)]
    #[case("downgrade", Direction::Downgrade)]
    fn ledger_rows_map_to_entries(#[case] raw: &str, #[case] expected: Direction) {
        let entry = row_to_entry(row(raw)).expect("valid row");
        assert_eq!(entry.direction, expected);
        assert_eq!(entry.revision, "00000000");
    }

    #[rstest]
    fn unknown_direction_is_a_ledger_error() {
        let err = row_to_entry(row("sideways")).expect_err("invalid direction");
        assert!(matches!(err, MigrationStoreError::Ledger { .. }));
    }

    #[rstest]
    fn pool_errors_are_connection_errors() {
        assert!(matches!(
            map_pool_error(PoolError::checkout("timed out")),
            MigrationStoreError::Connection { .. }
        ));
    }
}
