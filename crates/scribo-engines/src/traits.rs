//! Engine abstraction traits
//!
//! Each pipeline stage depends on one narrow trait so implementations can be
//! swapped per stage and tests can script outcomes.

use async_trait::async_trait;
use thiserror::Error;

/// Engine operation errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine request failed: {0}")]
    RequestFailed(String),

    #[error("Engine returned {status}: {body}")]
    UpstreamError { status: u16, body: String },

    #[error("Engine response malformed: {0}")]
    MalformedResponse(String),

    #[error("Engine not configured: {0}")]
    NotConfigured(String),
}

/// Result of a transcription call.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    /// Billed audio duration in seconds, as reported by the engine.
    pub duration_secs: f64,
}

/// Result of a chat-style completion (summarize, translate).
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    /// Total tokens billed for the call.
    pub total_tokens: i64,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        filename: &str,
        content_type: &str,
        audio: Vec<u8>,
    ) -> Result<Transcript, EngineError>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str) -> Result<Completion, EngineError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str)
        -> Result<Completion, EngineError>;
}
