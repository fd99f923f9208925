use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MAX_FILES: i64 = 10;
pub const DEFAULT_MAX_FILE_SIZE_BYTES: i64 = 10 * 1024 * 1024;
pub const DEFAULT_DAILY_FILE_LIMIT: i64 = 5;

/// Per-user upload limits. Users without a row get the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserQuota {
    pub user_id: Uuid,
    /// Maximum number of stored files at any one time.
    pub max_files: i64,
    /// Maximum size of a single upload, in bytes.
    pub max_file_size: i64,
    /// Maximum uploads per calendar day (local midnight boundary).
    pub daily_file_limit: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserQuota {
    pub fn default_for(user_id: Uuid) -> Self {
        let now = Utc::now();
        UserQuota {
            user_id,
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE_BYTES,
            daily_file_limit: DEFAULT_DAILY_FILE_LIMIT,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quota_values() {
        let quota = UserQuota::default_for(Uuid::new_v4());
        assert_eq!(quota.max_files, 10);
        assert_eq!(quota.max_file_size, 10 * 1024 * 1024);
        assert_eq!(quota.daily_file_limit, 5);
    }
}
