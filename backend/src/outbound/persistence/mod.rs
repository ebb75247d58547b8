//! PostgreSQL persistence adapters using Diesel with `diesel-async`.
//!
//! - [`DbPool`] wraps a `bb8` pool of async connections.
//! - [`DatabaseSessions`] is the session factory handed to the rest of the
//!   application; it degrades to a disabled state when the database is
//!   unreachable.
//! - [`DieselMigrationStore`] applies migration steps and keeps the ledger.

mod diesel_migration_store;
mod models;
mod pool;
mod schema;
mod sessions;

pub use diesel_migration_store::DieselMigrationStore;
pub use pool::{BASE_POOL_SIZE, DbPool, MAX_OVERFLOW, PoolConfig, PoolError, RECYCLE_AFTER};
pub use sessions::{DatabaseSessions, DbSession, SessionError};
