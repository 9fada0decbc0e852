//! Session-level Postgres advisory lock that keeps batch passes from
//! overlapping across processes (the server's cron pass and a CLI pass).

use async_trait::async_trait;
use followtrack_core::{PassLease, PassLock, StoreError};
use sqlx::{Connection, PgConnection, PgPool};

/// Advisory lock key shared by every process that runs sync passes.
pub const SYNC_PASS_LOCK_KEY: i64 = 0x6674_7379_6e63;

#[derive(Debug, Clone)]
pub struct PgPassLock {
    pool: PgPool,
    key: i64,
}

impl PgPassLock {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            key: SYNC_PASS_LOCK_KEY,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: i64) -> Self {
        self.key = key;
        self
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl PassLock for PgPassLock {
    /// Takes the lock on a connection detached from the pool. Advisory locks
    /// belong to the session, so the connection must not go back to the pool
    /// while held; closing it (or dropping the lease) frees the lock.
    async fn try_acquire(&self) -> Result<Option<Box<dyn PassLease>>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(backend)?.detach();

        let locked = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_lock($1)")
            .bind(self.key)
            .fetch_one(&mut conn)
            .await
            .map_err(backend)?;

        if !locked {
            if let Err(e) = conn.close().await {
                tracing::debug!(error = %e, "sync: closing lock connection failed");
            }
            return Ok(None);
        }

        tracing::debug!(key = self.key, "sync: pass lock acquired");
        Ok(Some(Box::new(PgPassLease {
            conn,
            key: self.key,
        })))
    }
}

struct PgPassLease {
    conn: PgConnection,
    key: i64,
}

#[async_trait]
impl PassLease for PgPassLease {
    async fn release(self: Box<Self>) {
        let Self { mut conn, key } = *self;

        if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(key)
            .execute(&mut conn)
            .await
        {
            tracing::warn!(key, error = %e, "sync: pass lock unlock failed, closing the session");
        }
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "sync: closing lock connection failed");
        }
    }
}
