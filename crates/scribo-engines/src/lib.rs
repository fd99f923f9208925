//! AI engine clients for the processing pipeline.
//!
//! The pipeline talks to three engine traits (transcribe, summarize,
//! translate); this crate provides the OpenAI-backed implementations. Tests
//! substitute scripted fakes, so nothing here is required for the state
//! machine itself.

pub mod openai;
pub mod traits;

pub use openai::OpenAiEngine;
pub use traits::{Completion, EngineError, Summarizer, Transcriber, Transcript, Translator};
