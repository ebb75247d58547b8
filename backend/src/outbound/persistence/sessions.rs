//! Database session factory with graceful degradation.
//!
//! [`DatabaseSessions::connect`] never fails: when the pool cannot be built
//! the factory starts disabled and every acquisition reports
//! [`SessionError::Unavailable`]. Sessions hand their connection back to the
//! pool when dropped, so every exit path releases it.

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::scoped_futures::{ScopedBoxFuture, ScopedFutureExt as _};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::{info, warn};

use crate::domain::ports::{DatabaseProbe, DatabaseProbeError};

use super::pool::{DbPool, PoolConfig, PoolError};

/// Errors raised while acquiring or using a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The factory is disabled because the database was unreachable at
    /// startup.
    #[error("database sessions are unavailable")]
    Unavailable,
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("database query failed: {message}")]
    Query { message: String },
}

impl SessionError {
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

impl From<diesel::result::Error> for SessionError {
    fn from(err: diesel::result::Error) -> Self {
        Self::query(err.to_string())
    }
}

/// A checked-out connection, returned to the pool on drop.
pub struct DbSession {
    conn: PooledConnection<'static, AsyncPgConnection>,
}

impl Deref for DbSession {
    type Target = AsyncPgConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for DbSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

/// Hands out database sessions, or reports the database as unavailable.
#[derive(Clone)]
pub struct DatabaseSessions {
    pool: Option<DbPool>,
}

impl DatabaseSessions {
    /// Build the pool; on failure log and return a disabled factory.
    pub async fn connect(config: PoolConfig) -> Self {
        match DbPool::new(config).await {
            Ok(pool) => {
                info!("database pool ready");
                Self { pool: Some(pool) }
            }
            Err(err) => {
                warn!(error = %err, "database pool unavailable; sessions disabled");
                Self::disabled()
            }
        }
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool: Some(pool) }
    }

    pub fn disabled() -> Self {
        Self { pool: None }
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    pub fn pool(&self) -> Option<&DbPool> {
        self.pool.as_ref()
    }

    /// Check out a session.
    ///
    /// # Errors
    ///
    /// [`SessionError::Unavailable`] when disabled, [`SessionError::Pool`]
    /// when checkout times out.
    pub async fn acquire(&self) -> Result<DbSession, SessionError> {
        let pool = self.pool.as_ref().ok_or(SessionError::Unavailable)?;
        let conn = pool.get_owned().await?;
        Ok(DbSession { conn })
    }

    /// Run `work` with a session that is released whether it succeeds or
    /// fails.
    ///
    /// # Errors
    ///
    /// Acquisition errors, or whatever `work` returns.
    pub async fn run<'a, T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'r> FnOnce(&'r mut AsyncPgConnection) -> ScopedBoxFuture<'a, 'r, Result<T, E>>
            + Send
            + 'a,
        E: From<SessionError>,
    {
        let mut session = self.acquire().await?;
        work(&mut *session).await
    }
}

#[async_trait]
impl DatabaseProbe for DatabaseSessions {
    async fn ping(&self) -> Result<(), DatabaseProbeError> {
        self.run(|conn| {
            async move {
                diesel::sql_query("SELECT 1")
                    .execute(conn)
                    .await
                    .map(|_| ())
                    .map_err(SessionError::from)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| match err {
            SessionError::Query { message } => DatabaseProbeError::query(message),
            other => DatabaseProbeError::unavailable(other.to_string()),
        })
    }
}
