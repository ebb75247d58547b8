//! Applies migration plans through a [`MigrationStore`].
//!
//! The runner reads the ledger, verifies that every applied revision still
//! has the checksum it was applied with, plans from the current revision and
//! applies steps one at a time. The first failing step aborts the run; the
//! store rolls that step back, so the ledger stays at the last revision that
//! succeeded.

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::migrations::{
    Direction, LedgerEntry, MigrationChain, MigrationError, MigrationLedger, PlannedStep,
    RevisionTarget,
};
use crate::domain::ports::{MigrationStore, MigrationStoreError};

/// Errors raised by a migration run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationRunError {
    #[error(transparent)]
    Store(#[from] MigrationStoreError),
    #[error(transparent)]
    Plan(#[from] MigrationError),
    #[error("revision `{revision}` changed since it was applied (recorded {recorded}, now {expected})")]
    ChecksumMismatch {
        revision: String,
        recorded: String,
        expected: String,
    },
    #[error("{direction} of `{revision}` failed after {applied} step(s) succeeded: {source}")]
    StepFailed {
        revision: String,
        direction: Direction,
        applied: usize,
        #[source]
        source: MigrationStoreError,
    },
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub from: Option<String>,
    pub to: Option<String>,
    pub applied: Vec<String>,
}

/// Drives a [`MigrationChain`] against a store.
pub struct MigrationRunner<S> {
    chain: MigrationChain,
    store: S,
}

impl<S: MigrationStore> MigrationRunner<S> {
    pub fn new(chain: MigrationChain, store: S) -> Self {
        Self { chain, store }
    }

    pub fn chain(&self) -> &MigrationChain {
        &self.chain
    }

    /// Ledger entries in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationRunError::Store`] when the ledger cannot be read.
    pub async fn history(&self) -> Result<Vec<LedgerEntry>, MigrationRunError> {
        self.store.ensure_ledger().await?;
        Ok(self.store.load_ledger().await?)
    }

    /// Current revision; `None` means nothing is applied.
    ///
    /// # Errors
    ///
    /// Fails when the ledger cannot be read, names an unknown revision or
    /// records a checksum that no longer matches.
    pub async fn current(&self) -> Result<Option<String>, MigrationRunError> {
        let ledger = MigrationLedger::new(self.history().await?);
        let current = ledger.current(&self.chain)?;
        self.verify_checksums(&ledger, current.as_deref())?;
        Ok(current)
    }

    /// Steps an upgrade to head would run.
    ///
    /// # Errors
    ///
    /// See [`Self::current`].
    pub async fn pending(&self) -> Result<Vec<PlannedStep>, MigrationRunError> {
        let current = self.current().await?;
        Ok(self
            .chain
            .plan_upgrade(current.as_deref(), &RevisionTarget::Head)?)
    }

    /// SQL a run would execute, without executing it.
    ///
    /// # Errors
    ///
    /// See [`Self::current`]; planning errors are returned as
    /// [`MigrationRunError::Plan`].
    pub async fn dry_run(
        &self,
        direction: Direction,
        target: &RevisionTarget,
    ) -> Result<Vec<String>, MigrationRunError> {
        let current = self.current().await?;
        let steps = self.chain.plan(direction, current.as_deref(), target)?;
        Ok(steps
            .into_iter()
            .flat_map(|step| {
                std::iter::once(format!("-- {} {}", step.direction, step.revision))
                    .chain(step.statements)
            })
            .collect())
    }

    /// Apply upgrades up to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationRunError::StepFailed`] naming the failing revision
    /// and how many steps were applied before it.
    pub async fn upgrade(
        &self,
        target: &RevisionTarget,
    ) -> Result<MigrationReport, MigrationRunError> {
        self.run(Direction::Upgrade, target).await
    }

    /// Apply downgrades down to `target`.
    ///
    /// # Errors
    ///
    /// See [`Self::upgrade`].
    pub async fn downgrade(
        &self,
        target: &RevisionTarget,
    ) -> Result<MigrationReport, MigrationRunError> {
        self.run(Direction::Downgrade, target).await
    }

    async fn run(
        &self,
        direction: Direction,
        target: &RevisionTarget,
    ) -> Result<MigrationReport, MigrationRunError> {
        let from = self.current().await?;
        let steps = self.chain.plan(direction, from.as_deref(), target)?;
        if steps.is_empty() {
            info!(revision = from.as_deref().unwrap_or("base"), %target, "schema already at target");
        }

        let mut to = from.clone();
        let mut applied = Vec::with_capacity(steps.len());
        for step in &steps {
            if step.destructive {
                warn!(revision = %step.revision, %direction, "step drops tables or columns");
            }
            info!(revision = %step.revision, %direction, statements = step.statements.len(), "applying migration step");
            self.store
                .apply_step(step)
                .await
                .map_err(|source| MigrationRunError::StepFailed {
                    revision: step.revision.clone(),
                    direction,
                    applied: applied.len(),
                    source,
                })?;
            applied.push(step.revision.clone());
            to.clone_from(&step.resulting_revision);
        }

        Ok(MigrationReport { from, to, applied })
    }

    fn verify_checksums(
        &self,
        ledger: &MigrationLedger,
        current: Option<&str>,
    ) -> Result<(), MigrationRunError> {
        let Some(current) = current else {
            return Ok(());
        };
        for migration in self.chain.migrations() {
            if let Some(recorded) = ledger.recorded_checksum(migration.revision) {
                let expected = migration.checksum();
                if recorded != expected {
                    return Err(MigrationRunError::ChecksumMismatch {
                        revision: migration.revision.to_owned(),
                        recorded: recorded.to_owned(),
                        expected,
                    });
                }
            }
            if migration.revision == current {
                break;
            }
        }
        Ok(())
    }
}
