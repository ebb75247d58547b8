//! Startup and shutdown sequence with graceful degradation.
//!
//! Each dependency is probed once at startup. Failures are logged and
//! recorded in [`DependencyHealth`]; the process keeps running either way.

use tracing::{error, info, warn};

use crate::domain::health::{Dependency, DependencyHealth, DependencyStatus};
use crate::domain::ports::{DatabaseProbe, RealtimeBackend};

/// Probe the database, then initialise the realtime backend.
///
/// A failed database probe marks the database `Unavailable`. A failed
/// realtime backend marks realtime `Degraded`: connections on this process
/// still work, only cross-instance delivery is lost.
pub async fn startup(
    database: &dyn DatabaseProbe,
    realtime: &dyn RealtimeBackend,
    health: &DependencyHealth,
) {
    match database.ping().await {
        Ok(()) => {
            info!(dependency = Dependency::Database.as_str(), "database reachable");
            health.set(Dependency::Database, DependencyStatus::Healthy);
        }
        Err(err) => {
            error!(
                dependency = Dependency::Database.as_str(),
                error_kind = err.kind(),
                error = %err,
                "database probe failed; continuing without database"
            );
            health.set(Dependency::Database, DependencyStatus::Unavailable);
        }
    }

    match realtime.initialise().await {
        Ok(()) => {
            info!(dependency = Dependency::Realtime.as_str(), "realtime backend initialised");
            health.set(Dependency::Realtime, DependencyStatus::Healthy);
        }
        Err(err) => {
            warn!(
                dependency = Dependency::Realtime.as_str(),
                error_kind = err.kind(),
                error = %err,
                "realtime backend unavailable; serving local connections only"
            );
            health.set(Dependency::Realtime, DependencyStatus::Degraded);
        }
    }
}

/// Release the realtime backend. Errors are logged and swallowed.
pub async fn shutdown(realtime: &dyn RealtimeBackend) {
    match realtime.cleanup().await {
        Ok(()) => info!("realtime backend released"),
        Err(err) => warn!(error_kind = err.kind(), error = %err, "realtime backend cleanup failed"),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{
        DatabaseProbeError, LocalRealtimeBackend, MockDatabaseProbe, MockRealtimeBackend,
        RealtimeBackendError,
    };

    fn database(result: Result<(), DatabaseProbeError>) -> MockDatabaseProbe {
        let mut probe = MockDatabaseProbe::new();
        probe.expect_ping().times(1).return_once(move || result);
        probe
    }

    fn realtime(result: Result<(), RealtimeBackendError>) -> MockRealtimeBackend {
        let mut backend = MockRealtimeBackend::new();
        backend
            .expect_initialise()
            .times(1)
            .return_once(move || result);
        backend
    }

    #[rstest]
    #[case(Ok(()), Ok(()), DependencyStatus::Healthy, DependencyStatus::Healthy)]
    #[case(
        Err(DatabaseProbeError::unavailable("refused")),
        Ok(()),
        DependencyStatus::Unavailable,
        DependencyStatus::Healthy
    )]
    #[case(
        Ok(()),
        Err(RealtimeBackendError::connection("refused")),
        DependencyStatus::Healthy,
        DependencyStatus::Degraded
    )]
    #[case(
        Err(DatabaseProbeError::query("boom")),
        Err(RealtimeBackendError::command("boom")),
        DependencyStatus::Unavailable,
        DependencyStatus::Degraded
    )]
    #[tokio::test]
    async fn startup_records_each_dependency(
        #[case] db: Result<(), DatabaseProbeError>,
        #[case] rt: Result<(), RealtimeBackendError>,
        #[case] expected_db: DependencyStatus,
        #[case] expected_rt: DependencyStatus,
    ) {
        let health = DependencyHealth::new();
        startup(&database(db), &realtime(rt), &health).await;
        assert_eq!(health.get(Dependency::Database), expected_db);
        assert_eq!(health.get(Dependency::Realtime), expected_rt);
    }

    #[rstest]
    #[tokio::test]
    async fn shutdown_swallows_cleanup_errors() {
        let mut backend = MockRealtimeBackend::new();
        backend
            .expect_cleanup()
            .times(1)
            .return_once(|| Err(RealtimeBackendError::command("already closed")));
        shutdown(&backend).await;
    }

    #[rstest]
    #[tokio::test]
    async fn local_realtime_backend_is_always_healthy() {
        let health = DependencyHealth::new();
        startup(&database(Ok(())), &LocalRealtimeBackend, &health).await;
        assert_eq!(health.get(Dependency::Realtime), DependencyStatus::Healthy);
        shutdown(&LocalRealtimeBackend).await;
    }
}
