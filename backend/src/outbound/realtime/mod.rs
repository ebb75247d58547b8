//! Redis-backed [`RealtimeBackend`].
//!
//! The pool is built lazily by [`RealtimeBackend::initialise`], which also
//! sends a `PING` so a misconfigured URL surfaces at startup rather than on
//! the first broadcast.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{RealtimeBackend, RealtimeBackendError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Realtime backend over a `bb8` pool of Redis connections.
pub struct RedisRealtimeBackend {
    url: String,
    pool: RwLock<Option<Pool<RedisConnectionManager>>>,
}

impl RedisRealtimeBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: RwLock::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn is_connected(&self) -> bool {
        self.pool.read().await.is_some()
    }

    async fn build_pool(&self) -> Result<Pool<RedisConnectionManager>, RealtimeBackendError> {
        let manager = RedisConnectionManager::new(self.url.as_str())
            .map_err(|err| RealtimeBackendError::connection(err.to_string()))?;
        Pool::builder()
            .max_size(8)
            .connection_timeout(CONNECT_TIMEOUT)
            .build(manager)
            .await
            .map_err(|err| RealtimeBackendError::connection(err.to_string()))
    }
}

async fn ping(pool: &Pool<RedisConnectionManager>) -> Result<(), RealtimeBackendError> {
    let mut conn = pool
        .get()
        .await
        .map_err(|err| RealtimeBackendError::connection(err.to_string()))?;
    let reply: String = bb8_redis::redis::cmd("PING")
        .query_async(&mut *conn)
        .await
        .map_err(|err| RealtimeBackendError::command(err.to_string()))?;
    debug!(%reply, "redis ping");
    Ok(())
}

#[async_trait]
impl RealtimeBackend for RedisRealtimeBackend {
    async fn initialise(&self) -> Result<(), RealtimeBackendError> {
        let pool = self.build_pool().await?;
        ping(&pool).await?;
        *self.pool.write().await = Some(pool);
        Ok(())
    }

    async fn cleanup(&self) -> Result<(), RealtimeBackendError> {
        // Dropping the pool closes idle connections.
        self.pool.write().await.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn malformed_url_is_a_connection_error() {
        let backend = RedisRealtimeBackend::new("not a redis url");
        let err = backend.initialise().await.expect_err("invalid url");
        assert!(matches!(err, RealtimeBackendError::Connection { .. }));
        assert!(!backend.is_connected().await);
    }

    #[rstest]
    #[tokio::test]
    async fn cleanup_without_initialise_is_a_no_op() {
        let backend = RedisRealtimeBackend::new("redis://localhost:6379/0");
        backend.cleanup().await.expect("cleanup");
        assert_eq!(backend.url(), "redis://localhost:6379/0");
    }
}
