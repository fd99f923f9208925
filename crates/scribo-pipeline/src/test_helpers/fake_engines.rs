//! Scripted engine implementations for tests.

use async_trait::async_trait;
use scribo_engines::{
    Completion, EngineError, Summarizer, Transcriber, Transcript, Translator,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub struct FakeTranscriber {
    text: String,
    duration_secs: f64,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(text: &str, duration_secs: f64) -> Self {
        Self {
            text: text.to_string(),
            duration_secs,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn succeed(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(
        &self,
        _filename: &str,
        _content_type: &str,
        _audio: Vec<u8>,
    ) -> Result<Transcript, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EngineError::UpstreamError {
                status: 503,
                body: "transcriber unavailable".to_string(),
            });
        }
        Ok(Transcript {
            text: self.text.clone(),
            duration_secs: self.duration_secs,
        })
    }
}

pub struct FakeSummarizer {
    text: String,
    total_tokens: i64,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeSummarizer {
    pub fn new(text: &str, total_tokens: i64) -> Self {
        Self {
            text: text.to_string(),
            total_tokens,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn succeed(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, _transcript: &str) -> Result<Completion, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EngineError::UpstreamError {
                status: 503,
                body: "summarizer unavailable".to_string(),
            });
        }
        Ok(Completion {
            text: self.text.clone(),
            total_tokens: self.total_tokens,
        })
    }
}

pub struct FakeTranslator {
    text: String,
    total_tokens: i64,
    fail: AtomicBool,
    calls: AtomicUsize,
    last_input: Mutex<Option<String>>,
}

impl FakeTranslator {
    pub fn new(text: &str, total_tokens: i64) -> Self {
        Self {
            text: text.to_string(),
            total_tokens,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn succeed(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The text the translator was last asked to translate.
    pub fn last_input(&self) -> Option<String> {
        self.last_input.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(
        &self,
        text: &str,
        _target_language: &str,
    ) -> Result<Completion, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(text.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(EngineError::UpstreamError {
                status: 503,
                body: "translator unavailable".to_string(),
            });
        }
        Ok(Completion {
            text: self.text.clone(),
            total_tokens: self.total_tokens,
        })
    }
}
