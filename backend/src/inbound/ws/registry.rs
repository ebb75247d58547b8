//! Live WebSocket connections on this process.
//!
//! Tokens are never stored; each connection keeps a short SHA-256
//! fingerprint of its token so logs can correlate connections without
//! leaking credentials.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use mockable::Clock;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const FINGERPRINT_HEX_LEN: usize = 16;

/// Metadata about one open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub token_fingerprint: String,
    pub connected_at: DateTime<Utc>,
}

/// Truncated SHA-256 hex of `token`.
pub fn token_fingerprint(token: &str) -> String {
    let digest = hex::encode(Sha256::digest(token.as_bytes()));
    digest[..FINGERPRINT_HEX_LEN].to_owned()
}

/// Registry of open connections keyed by connection id.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, ConnectionInfo>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl ConnectionRegistry {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Record a connection and return a guard that removes it on drop.
    pub fn register(self: &Arc<Self>, token: &str) -> Registration {
        let id = Uuid::new_v4();
        let info = ConnectionInfo {
            token_fingerprint: token_fingerprint(token),
            connected_at: self.clock.utc(),
        };
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, info);
        Registration {
            registry: Arc::clone(self),
            id,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<ConnectionInfo> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: Uuid) {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// Keeps a connection registered for as long as it lives.
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    id: Uuid,
}

impl Registration {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use mockable::MockClock;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn registry() -> Arc<ConnectionRegistry> {
        let mut clock = MockClock::new();
        clock
            .expect_utc()
            .returning(|| Utc.with_ymd_and_hms(2025, 9, 15, 12, 0, 0).unwrap());
        Arc::new(ConnectionRegistry::new(Arc::new(clock)))
    }

    #[rstest]
    fn registration_lives_until_dropped(registry: Arc<ConnectionRegistry>) {
        let first = registry.register("token-a");
        let second = registry.register("token-b");
        assert_eq!(registry.len(), 2);

        let info = registry.get(first.id()).expect("registered");
        assert_eq!(info.token_fingerprint, token_fingerprint("token-a"));
        assert_eq!(
            info.connected_at,
            Utc.with_ymd_and_hms(2025, 9, 15, 12, 0, 0).unwrap()
        );

        drop(first);
        assert_eq!(registry.len(), 1);
        drop(second);
        assert!(registry.is_empty());
    }

    #[rstest]
    fn fingerprints_hide_the_token() {
        let fingerprint = token_fingerprint("secret-token");
        assert_eq!(fingerprint.len(), 16);
        assert!(!fingerprint.contains("secret"));
        assert_eq!(fingerprint, token_fingerprint("secret-token"));
        assert_ne!(fingerprint, token_fingerprint("other-token"));
    }
}
