use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Usage/error ledger for one file, keyed 1:1 by file id.
///
/// Created lazily on the first usage event and upserted thereafter. The usage
/// counters only ever grow; `last_error` reflects the most recent failed
/// attempt and is cleared when a retry is admitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProcessingLog {
    pub file_id: Uuid,
    /// Seconds of audio billed by the transcription engine, accumulated.
    pub whisper_duration: f64,
    /// Tokens billed by the summarize and translate stages, accumulated.
    pub token_count: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Increment applied to a processing log by one completed stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageDelta {
    pub whisper_duration: f64,
    pub token_count: i64,
}

impl UsageDelta {
    pub fn transcription(duration_secs: f64) -> Self {
        Self {
            whisper_duration: duration_secs,
            token_count: 0,
        }
    }

    pub fn tokens(count: i64) -> Self {
        Self {
            whisper_duration: 0.0,
            token_count: count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessingLogResponse {
    pub whisper_duration: f64,
    pub token_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProcessingLog> for ProcessingLogResponse {
    fn from(log: ProcessingLog) -> Self {
        ProcessingLogResponse {
            whisper_duration: log.whisper_duration,
            token_count: log.token_count,
            last_error: log.last_error,
            updated_at: log.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_delta_constructors() {
        let d = UsageDelta::transcription(12.5);
        assert_eq!(d.whisper_duration, 12.5);
        assert_eq!(d.token_count, 0);

        let d = UsageDelta::tokens(340);
        assert_eq!(d.whisper_duration, 0.0);
        assert_eq!(d.token_count, 340);
    }
}
