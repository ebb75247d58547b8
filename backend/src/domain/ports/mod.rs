//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod database_probe;
mod migration_store;
mod realtime_backend;

#[cfg(test)]
pub use database_probe::MockDatabaseProbe;
pub use database_probe::{DatabaseProbe, DatabaseProbeError};
#[cfg(test)]
pub use migration_store::MockMigrationStore;
pub use migration_store::{MigrationStore, MigrationStoreError};
#[cfg(test)]
pub use realtime_backend::MockRealtimeBackend;
pub use realtime_backend::{LocalRealtimeBackend, RealtimeBackend, RealtimeBackendError};
