//! Schema revisions, migration plans and the applied-revision ledger.
//!
//! Revisions form a strict linear chain. A plan always starts at the ledger's
//! current revision, so revisions can only be applied in chain order.

pub mod revisions;
mod tables;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::schema::{
    SchemaChange, SchemaDefinition, SchemaError, diff_schemas, render_change_sql,
};

/// A single schema revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub revision: &'static str,
    pub down_revision: Option<&'static str>,
    pub message: &'static str,
    pub upgrade: Vec<SchemaChange>,
    pub downgrade: Vec<SchemaChange>,
}

impl Migration {
    /// Rendered upgrade DDL.
    pub fn upgrade_sql(&self) -> Vec<String> {
        self.upgrade.iter().flat_map(render_change_sql).collect()
    }

    /// Rendered downgrade DDL.
    pub fn downgrade_sql(&self) -> Vec<String> {
        self.downgrade.iter().flat_map(render_change_sql).collect()
    }

    /// SHA-256 (hex) of the revision id and its rendered upgrade DDL.
    ///
    /// Stored with every ledger entry and compared on later runs to detect a
    /// revision whose definition changed after it was applied.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.revision.as_bytes());
        for statement in self.upgrade_sql() {
            hasher.update(b"\n");
            hasher.update(statement.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Direction a step moves the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Upgrade,
    Downgrade,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = MigrationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "upgrade" | "up" => Ok(Self::Upgrade),
            "downgrade" | "down" => Ok(Self::Downgrade),
            other => Err(MigrationError::UnknownDirection {
                direction: other.to_owned(),
            }),
        }
    }
}

/// Where a plan should leave the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionTarget {
    /// The newest revision.
    Head,
    /// Before the first revision (empty schema).
    Base,
    Revision(String),
}

impl FromStr for RevisionTarget {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "head" => Self::Head,
            "base" => Self::Base,
            other => Self::Revision(other.to_owned()),
        })
    }
}

impl fmt::Display for RevisionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Base => f.write_str("base"),
            Self::Revision(revision) => f.write_str(revision),
        }
    }
}

/// Errors raised while building or planning the revision chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    #[error("migration chain is empty")]
    EmptyChain,
    #[error("revision `{revision}` appears more than once")]
    DuplicateRevision { revision: String },
    #[error("expected exactly one root revision, found {count}")]
    RootCount { count: usize },
    #[error("revision `{revision}` revises unknown `{down_revision}`")]
    MissingPredecessor {
        revision: String,
        down_revision: String,
    },
    #[error("revision `{down_revision}` has more than one successor")]
    Branch { down_revision: String },
    #[error("unknown revision `{revision}`")]
    UnknownRevision { revision: String },
    #[error("unknown direction `{direction}`")]
    UnknownDirection { direction: String },
    #[error("cannot {direction} from `{current}` to `{target}`")]
    WrongDirection {
        direction: Direction,
        current: String,
        target: String,
    },
    #[error("revision `{revision}` does not apply: {source}")]
    Schema {
        revision: String,
        #[source]
        source: SchemaError,
    },
}

/// One step of a migration plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    /// Revision whose upgrade or downgrade runs.
    pub revision: String,
    pub direction: Direction,
    /// Checksum of the revision's upgrade DDL.
    pub checksum: String,
    /// Ledger revision once the step has been applied.
    pub resulting_revision: Option<String>,
    /// Whether the step drops tables or columns.
    pub destructive: bool,
    pub statements: Vec<String>,
}

/// A validated, strictly linear revision chain.
#[derive(Debug, Clone)]
pub struct MigrationChain {
    migrations: Vec<Migration>,
}

impl MigrationChain {
    /// Validate and order `migrations` into a chain.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] when the chain is empty, has duplicate
    /// revisions, a dangling predecessor, branches, or not exactly one root.
    pub fn new(migrations: Vec<Migration>) -> Result<Self, MigrationError> {
        if migrations.is_empty() {
            return Err(MigrationError::EmptyChain);
        }

        for (index, migration) in migrations.iter().enumerate() {
            if migrations
                .iter()
                .take(index)
                .any(|earlier| earlier.revision == migration.revision)
            {
                return Err(MigrationError::DuplicateRevision {
                    revision: migration.revision.to_owned(),
                });
            }
        }

        let roots = migrations
            .iter()
            .filter(|migration| migration.down_revision.is_none())
            .count();
        if roots != 1 {
            return Err(MigrationError::RootCount { count: roots });
        }

        for migration in &migrations {
            let Some(down_revision) = migration.down_revision else {
                continue;
            };
            if !migrations
                .iter()
                .any(|candidate| candidate.revision == down_revision)
            {
                return Err(MigrationError::MissingPredecessor {
                    revision: migration.revision.to_owned(),
                    down_revision: down_revision.to_owned(),
                });
            }
            let successors = migrations
                .iter()
                .filter(|candidate| candidate.down_revision == Some(down_revision))
                .count();
            if successors > 1 {
                return Err(MigrationError::Branch {
                    down_revision: down_revision.to_owned(),
                });
            }
        }

        let mut remaining = migrations;
        let mut ordered = Vec::with_capacity(remaining.len());
        let mut previous: Option<&'static str> = None;
        while let Some(position) = remaining
            .iter()
            .position(|migration| migration.down_revision == previous)
        {
            let migration = remaining.swap_remove(position);
            previous = Some(migration.revision);
            ordered.push(migration);
        }
        if let Some(orphan) = remaining.first() {
            // Only reachable through a cycle detached from the root.
            return Err(MigrationError::MissingPredecessor {
                revision: orphan.revision.to_owned(),
                down_revision: orphan.down_revision.unwrap_or_default().to_owned(),
            });
        }

        Ok(Self { migrations: ordered })
    }

    /// The pantry schema chain.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in revisions are inconsistent.
    pub fn pantry() -> Result<Self, MigrationError> {
        Self::new(revisions::all())
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn head(&self) -> &'static str {
        self.migrations
            .last()
            .map_or("", |migration| migration.revision)
    }

    pub fn get(&self, revision: &str) -> Option<&Migration> {
        self.migrations
            .iter()
            .find(|migration| migration.revision == revision)
    }

    /// Position of `revision`, or `None` for the base (no revision).
    fn position(&self, revision: Option<&str>) -> Result<Option<usize>, MigrationError> {
        revision
            .map(|revision| {
                self.migrations
                    .iter()
                    .position(|migration| migration.revision == revision)
                    .ok_or_else(|| MigrationError::UnknownRevision {
                        revision: revision.to_owned(),
                    })
            })
            .transpose()
    }

    fn target_position(&self, target: &RevisionTarget) -> Result<Option<usize>, MigrationError> {
        match target {
            RevisionTarget::Head => Ok(self.migrations.len().checked_sub(1)),
            RevisionTarget::Base => Ok(None),
            RevisionTarget::Revision(revision) => self.position(Some(revision)),
        }
    }

    /// Migrations with positions in `start..end`.
    fn window(&self, start: usize, end: usize) -> impl DoubleEndedIterator<Item = &Migration> {
        self.migrations
            .iter()
            .skip(start)
            .take(end.saturating_sub(start))
    }

    /// Steps that move the schema from `current` up to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::UnknownRevision`] for revisions outside the
    /// chain and [`MigrationError::WrongDirection`] when `target` is older
    /// than `current`.
    pub fn plan_upgrade(
        &self,
        current: Option<&str>,
        target: &RevisionTarget,
    ) -> Result<Vec<PlannedStep>, MigrationError> {
        let from = self.position(current)?;
        let to = self.target_position(target)?;
        if to < from {
            return Err(MigrationError::WrongDirection {
                direction: Direction::Upgrade,
                current: current.unwrap_or("base").to_owned(),
                target: target.to_string(),
            });
        }
        let start = from.map_or(0, |index| index + 1);
        let end = to.map_or(0, |index| index + 1);
        Ok(self
            .window(start, end)
            .map(|migration| PlannedStep {
                revision: migration.revision.to_owned(),
                direction: Direction::Upgrade,
                checksum: migration.checksum(),
                resulting_revision: Some(migration.revision.to_owned()),
                destructive: migration.upgrade.iter().any(SchemaChange::is_destructive),
                statements: migration.upgrade_sql(),
            })
            .collect())
    }

    /// Steps that move the schema from `current` down to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::UnknownRevision`] for revisions outside the
    /// chain and [`MigrationError::WrongDirection`] when `target` is newer
    /// than `current`.
    pub fn plan_downgrade(
        &self,
        current: Option<&str>,
        target: &RevisionTarget,
    ) -> Result<Vec<PlannedStep>, MigrationError> {
        let from = self.position(current)?;
        let to = self.target_position(target)?;
        if to > from {
            return Err(MigrationError::WrongDirection {
                direction: Direction::Downgrade,
                current: current.unwrap_or("base").to_owned(),
                target: target.to_string(),
            });
        }
        let start = to.map_or(0, |index| index + 1);
        let end = from.map_or(0, |index| index + 1);
        Ok(self
            .window(start, end)
            .rev()
            .map(|migration| PlannedStep {
                revision: migration.revision.to_owned(),
                direction: Direction::Downgrade,
                checksum: migration.checksum(),
                resulting_revision: migration.down_revision.map(str::to_owned),
                destructive: migration.downgrade.iter().any(SchemaChange::is_destructive),
                statements: migration.downgrade_sql(),
            })
            .collect())
    }

    /// Plan in either direction.
    ///
    /// # Errors
    ///
    /// See [`Self::plan_upgrade`] and [`Self::plan_downgrade`].
    pub fn plan(
        &self,
        direction: Direction,
        current: Option<&str>,
        target: &RevisionTarget,
    ) -> Result<Vec<PlannedStep>, MigrationError> {
        match direction {
            Direction::Upgrade => self.plan_upgrade(current, target),
            Direction::Downgrade => self.plan_downgrade(current, target),
        }
    }

    /// Schema after applying every upgrade up to and including `revision`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Schema`] naming the first revision whose
    /// changes do not apply.
    pub fn schema_at(&self, revision: Option<&str>) -> Result<SchemaDefinition, MigrationError> {
        let end = self.position(revision)?.map_or(0, |index| index + 1);
        self.migrations
            .iter()
            .take(end)
            .try_fold(SchemaDefinition::empty(), |schema, migration| {
                schema
                    .apply_all(&migration.upgrade)
                    .map_err(|source| MigrationError::Schema {
                        revision: migration.revision.to_owned(),
                        source,
                    })
            })
    }

    /// Schema changes that turn the schema at `from` into the schema at `to`.
    ///
    /// Unlike a plan, this compares the two replayed schemas directly, so a
    /// table that a revision drops and recreates shows up as column changes.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::UnknownRevision`] for revisions outside the
    /// chain, or [`MigrationError::Schema`] when a replay fails.
    pub fn diff_between(
        &self,
        from: &RevisionTarget,
        to: &RevisionTarget,
    ) -> Result<Vec<SchemaChange>, MigrationError> {
        let revision_at = |target: &RevisionTarget| {
            self.target_position(target).map(|position| {
                position
                    .and_then(|index| self.migrations.get(index))
                    .map(|migration| migration.revision)
            })
        };
        let before = self.schema_at(revision_at(from)?)?;
        let after = self.schema_at(revision_at(to)?)?;
        Ok(diff_schemas(&before, &after))
    }

    /// Schema after the whole upgrade chain.
    ///
    /// # Errors
    ///
    /// See [`Self::schema_at`].
    pub fn final_schema(&self) -> Result<SchemaDefinition, MigrationError> {
        self.schema_at(Some(self.head()))
    }
}

/// A row of the append-only migration ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub revision: String,
    pub direction: Direction,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

/// Replays ledger entries against a chain.
#[derive(Debug, Clone, Default)]
pub struct MigrationLedger {
    entries: Vec<LedgerEntry>,
}

impl MigrationLedger {
    /// Entries must be in insertion order.
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Effective head after replaying every entry; `None` means base.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::UnknownRevision`] when an entry names a
    /// revision the chain does not know.
    pub fn current(&self, chain: &MigrationChain) -> Result<Option<String>, MigrationError> {
        self.entries.iter().try_fold(None, |_, entry| {
            let migration =
                chain
                    .get(&entry.revision)
                    .ok_or_else(|| MigrationError::UnknownRevision {
                        revision: entry.revision.clone(),
                    })?;
            Ok(match entry.direction {
                Direction::Upgrade => Some(migration.revision.to_owned()),
                Direction::Downgrade => migration.down_revision.map(str::to_owned),
            })
        })
    }

    /// Checksum recorded by the latest upgrade of `revision`.
    pub fn recorded_checksum(&self, revision: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.revision == revision && entry.direction == Direction::Upgrade)
            .map(|entry| entry.checksum.as_str())
    }
}
