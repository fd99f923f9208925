//! Quota repository: per-user limits with built-in defaults.

use async_trait::async_trait;
use scribo_core::models::UserQuota;
use scribo_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::stores::QuotaStore;

/// Repository for the user_quotas table.
#[derive(Clone)]
pub struct QuotaRepository {
    pool: PgPool,
}

impl QuotaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaStore for QuotaRepository {
    #[tracing::instrument(skip(self), fields(db.table = "user_quotas", user_id = %user_id))]
    async fn get_for_user(&self, user_id: Uuid) -> Result<UserQuota, AppError> {
        let row: Option<UserQuota> = sqlx::query_as::<Postgres, UserQuota>(
            r#"
            SELECT user_id, max_files, max_file_size, daily_file_limit, created_at, updated_at
            FROM user_quotas WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.unwrap_or_else(|| UserQuota::default_for(user_id)))
    }
}
