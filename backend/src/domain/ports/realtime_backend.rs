//! Port for the shared backend behind realtime collaboration.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by the realtime backend.
    pub enum RealtimeBackendError {
        /// The backend could not be reached.
        Connection { message: String } =>
            "realtime backend connection failed: {message}",
        /// A backend command failed.
        Command { message: String } =>
            "realtime backend command failed: {message}",
    }
}

/// Lifecycle hooks for the realtime backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeBackend: Send + Sync {
    /// Connect and verify the backend responds.
    async fn initialise(&self) -> Result<(), RealtimeBackendError>;

    /// Release backend resources. Called once during shutdown.
    async fn cleanup(&self) -> Result<(), RealtimeBackendError>;
}

/// Process-local backend used when no shared backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRealtimeBackend;

#[async_trait]
impl RealtimeBackend for LocalRealtimeBackend {
    async fn initialise(&self) -> Result<(), RealtimeBackendError> {
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), RealtimeBackendError> {
        Ok(())
    }
}
