//! Port for checking database reachability.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by a database round trip.
    pub enum DatabaseProbeError {
        /// No connection could be obtained.
        Unavailable { message: String } =>
            "database unavailable: {message}",
        /// The probe query failed.
        Query { message: String } =>
            "database probe failed: {message}",
    }
}

/// Minimal round trip used at startup and by health checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Execute a trivial query (`SELECT 1`).
    async fn ping(&self) -> Result<(), DatabaseProbeError>;
}
