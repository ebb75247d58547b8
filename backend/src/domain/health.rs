//! Typed health of the service's external dependencies.
//!
//! Startup never aborts because a dependency is down; the outcome of each
//! probe is recorded here instead and surfaced by the `/health` endpoint.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

/// State of one dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    /// Not probed yet.
    Pending,
    Healthy,
    /// Reachable only in a reduced mode.
    Degraded,
    Unavailable,
}

impl DependencyStatus {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Healthy => 1,
            Self::Degraded => 2,
            Self::Unavailable => 3,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Healthy,
            2 => Self::Degraded,
            3 => Self::Unavailable,
            _ => Self::Pending,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unavailable => "unavailable",
        }
    }
}

/// External dependencies tracked by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Database,
    Realtime,
}

impl Dependency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Realtime => "realtime",
        }
    }
}

/// Point-in-time view of every dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthSnapshot {
    pub database: DependencyStatus,
    pub realtime: DependencyStatus,
}

impl HealthSnapshot {
    /// Worst status across dependencies; `Unavailable` is reported as
    /// `Degraded` because the process keeps serving. A dependency that has
    /// not been probed yet outranks a healthy one.
    pub fn overall(&self) -> DependencyStatus {
        let worst = if severity(self.database) >= severity(self.realtime) {
            self.database
        } else {
            self.realtime
        };
        match worst {
            DependencyStatus::Unavailable => DependencyStatus::Degraded,
            other => other,
        }
    }
}

const fn severity(status: DependencyStatus) -> u8 {
    match status {
        DependencyStatus::Healthy => 0,
        DependencyStatus::Pending => 1,
        DependencyStatus::Degraded => 2,
        DependencyStatus::Unavailable => 3,
    }
}

/// Lock-free dependency status shared between startup and request handlers.
#[derive(Debug, Default)]
pub struct DependencyHealth {
    database: AtomicU8,
    realtime: AtomicU8,
}

impl DependencyHealth {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, dependency: Dependency) -> &AtomicU8 {
        match dependency {
            Dependency::Database => &self.database,
            Dependency::Realtime => &self.realtime,
        }
    }

    pub fn set(&self, dependency: Dependency, status: DependencyStatus) {
        self.slot(dependency).store(status.to_u8(), Ordering::Release);
    }

    pub fn get(&self, dependency: Dependency) -> DependencyStatus {
        DependencyStatus::from_u8(self.slot(dependency).load(Ordering::Acquire))
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            database: self.get(Dependency::Database),
            realtime: self.get(Dependency::Realtime),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn dependencies_start_pending() {
        let health = DependencyHealth::new();
        assert_eq!(
            health.snapshot(),
            HealthSnapshot {
                database: DependencyStatus::Pending,
                realtime: DependencyStatus::Pending,
            }
        );
    }

    #[rstest]
    #[case(DependencyStatus::Healthy, DependencyStatus::Healthy, DependencyStatus::Healthy)]
    #[case(DependencyStatus::Healthy, DependencyStatus::Degraded, DependencyStatus::Degraded)]
    #[case(DependencyStatus::Unavailable, DependencyStatus::Healthy, DependencyStatus::Degraded)]
    #[case(DependencyStatus::Pending, DependencyStatus::Pending, DependencyStatus::Pending)]
    #[case(DependencyStatus::Pending, DependencyStatus::Healthy, DependencyStatus::Pending)]
    #[case(DependencyStatus::Healthy, DependencyStatus::Pending, DependencyStatus::Pending)]
    #[case(DependencyStatus::Pending, DependencyStatus::Unavailable, DependencyStatus::Degraded)]
    fn overall_reports_the_worst_dependency(
        #[case] database: DependencyStatus,
        #[case] realtime: DependencyStatus,
        #[case] expected: DependencyStatus,
    ) {
        let health = DependencyHealth::new();
        health.set(Dependency::Database, database);
        health.set(Dependency::Realtime, realtime);
        assert_eq!(health.get(Dependency::Database), database);
        assert_eq!(health.snapshot().overall(), expected);
    }

    #[rstest]
    fn statuses_serialise_in_snake_case() {
        let json = serde_json::to_value(HealthSnapshot {
            database: DependencyStatus::Unavailable,
            realtime: DependencyStatus::Healthy,
        })
        .expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({"database": "unavailable", "realtime": "healthy"})
        );
    }
}
