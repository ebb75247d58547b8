//! Domain model and services.
//!
//! Purpose: describe the pantry schema as data, plan and apply its revisions,
//! and hold the entity rules and dependency health used by the adapters.
//! Nothing here performs I/O directly; adapters implement [`ports`].
//!
//! Public surface:
//! - `schema`: declarative tables, changes, diffing and DDL rendering.
//! - `migrations`: the revision chain, plans and ledger replay.
//! - `migration_runner`: applies plans through a `MigrationStore`.
//! - `constraints`: in-memory evaluation of unique and check constraints.
//! - `data_model`: validated pantry entities.
//! - `health` / `lifecycle`: dependency status and startup/shutdown.

pub mod constraints;
pub mod data_model;
pub mod health;
pub mod lifecycle;
pub mod migration_runner;
pub mod migrations;
pub mod ports;
pub mod schema;

pub use self::health::{Dependency, DependencyHealth, DependencyStatus, HealthSnapshot};
pub use self::migration_runner::{MigrationReport, MigrationRunError, MigrationRunner};
pub use self::migrations::{Direction, MigrationChain, RevisionTarget};
