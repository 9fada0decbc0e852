//! Postgres implementation of [`AccountStore`] over the `tracked_accounts` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use followtrack_core::{AccountStore, NewTrackedAccount, StoreError, TrackedAccount};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `tracked_accounts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrackedAccountRow {
    pub id: i64,
    pub owner_id: Uuid,
    pub platform_username: String,
    pub notification_target: String,
    pub current_following_count: i64,
    pub following_list: Vec<String>,
    pub count_only: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_checked: DateTime<Utc>,
}

impl From<TrackedAccountRow> for TrackedAccount {
    fn from(row: TrackedAccountRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            platform_username: row.platform_username,
            notification_target: row.notification_target,
            // The column carries a CHECK (>= 0).
            current_following_count: u64::try_from(row.current_following_count).unwrap_or(0),
            following_list: row.following_list.into_iter().collect(),
            count_only: row.count_only,
            is_active: row.is_active,
            created_at: row.created_at,
            last_checked: row.last_checked,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, owner_id, platform_username, notification_target, \
            current_following_count, following_list, count_only, is_active, created_at, last_checked \
     FROM tracked_accounts";

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn count_to_db(count: u64) -> Result<i64, StoreError> {
    i64::try_from(count)
        .map_err(|_| StoreError::Backend(format!("following count {count} out of range")))
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn list_active(&self) -> Result<Vec<TrackedAccount>, StoreError> {
        let rows = sqlx::query_as::<_, TrackedAccountRow>(&format!(
            "{SELECT_COLUMNS} WHERE is_active = true ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(TrackedAccount::from).collect())
    }

    async fn get_active(
        &self,
        owner_id: Uuid,
        username: &str,
    ) -> Result<Option<TrackedAccount>, StoreError> {
        let row = sqlx::query_as::<_, TrackedAccountRow>(&format!(
            "{SELECT_COLUMNS} WHERE owner_id = $1 AND platform_username = $2 AND is_active = true"
        ))
        .bind(owner_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(TrackedAccount::from))
    }

    async fn count_active_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tracked_accounts WHERE owner_id = $1 AND is_active = true",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn insert(&self, account: NewTrackedAccount) -> Result<TrackedAccount, StoreError> {
        let result = sqlx::query_as::<_, TrackedAccountRow>(
            "INSERT INTO tracked_accounts \
                 (owner_id, platform_username, notification_target, current_following_count, count_only) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, owner_id, platform_username, notification_target, \
                       current_following_count, following_list, count_only, is_active, \
                       created_at, last_checked",
        )
        .bind(account.owner_id)
        .bind(&account.platform_username)
        .bind(&account.notification_target)
        .bind(count_to_db(account.current_following_count)?)
        .bind(account.count_only)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate {
                    owner_id: account.owner_id,
                    username: account.platform_username,
                })
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn is_active(&self, id: i64) -> Result<bool, StoreError> {
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM tracked_accounts WHERE id = $1 AND is_active = true)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(active)
    }

    /// The stored `count_only` flag wins: a count-only row keeps an empty list.
    /// Rows deactivated since the pass read them are left untouched.
    async fn save_sync_state(&self, account: &TrackedAccount) -> Result<(), StoreError> {
        let following: Vec<&str> = account.following_list.iter().map(String::as_str).collect();

        let result = sqlx::query(
            "UPDATE tracked_accounts \
             SET current_following_count = $2, \
                 following_list = CASE WHEN count_only THEN '{}'::TEXT[] ELSE $3::TEXT[] END, \
                 is_active = is_active AND $4, \
                 last_checked = $5 \
             WHERE id = $1 AND is_active = true",
        )
        .bind(account.id)
        .bind(count_to_db(account.current_following_count)?)
        .bind(&following)
        .bind(account.is_active)
        .bind(account.last_checked)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(account.id));
        }
        Ok(())
    }

    async fn deactivate(&self, id: i64, owner_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE tracked_accounts SET is_active = false \
             WHERE id = $1 AND owner_id = $2 AND is_active = true",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        tracing::info!(id, %owner_id, "tracker deactivated");
        Ok(())
    }
}
