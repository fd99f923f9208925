// OpenAI-backed engine: Whisper for transcription, chat completions for
// summarize and translate.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::traits::{
    Completion, EngineError, Summarizer, Transcriber, Transcript, Translator,
};
use scribo_core::AppConfig;

const SUMMARY_PROMPT: &str = "Summarize the following transcript in a few concise paragraphs. \
     Keep the speaker's key points and any action items.";

#[derive(Clone)]
pub struct OpenAiEngine {
    http_client: Client,
    api_key: String,
    base_url: String,
    transcription_model: String,
    chat_model: String,
}

impl OpenAiEngine {
    pub fn from_config(config: &AppConfig) -> Result<Self, EngineError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| EngineError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.engine_timeout_seconds))
            .build()
            .map_err(|e| EngineError::RequestFailed(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            transcription_model: config.transcription_model.clone(),
            chat_model: config.chat_model.clone(),
        })
    }

    async fn chat(&self, system: &str, user: &str) -> Result<Completion, EngineError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EngineError::UpstreamError {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                EngineError::MalformedResponse("chat completion had no choices".to_string())
            })?;

        let total_tokens = completion.usage.map(|u| u.total_tokens).unwrap_or(0);

        Ok(Completion { text, total_tokens })
    }
}

#[async_trait]
impl Transcriber for OpenAiEngine {
    async fn transcribe(
        &self,
        filename: &str,
        content_type: &str,
        audio: Vec<u8>,
    ) -> Result<Transcript, EngineError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let part = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| EngineError::RequestFailed(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.transcription_model.clone())
            .text("response_format", "verbose_json");

        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EngineError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EngineError::UpstreamError {
                status: status.as_u16(),
                body,
            });
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

        tracing::info!(
            filename = %filename,
            audio_secs = transcription.duration,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Transcription completed"
        );

        Ok(Transcript {
            text: transcription.text,
            duration_secs: transcription.duration,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiEngine {
    async fn summarize(&self, transcript: &str) -> Result<Completion, EngineError> {
        self.chat(SUMMARY_PROMPT, transcript).await
    }
}

#[async_trait]
impl Translator for OpenAiEngine {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<Completion, EngineError> {
        let system = format!(
            "Translate the following text into {}. Preserve formatting and tone. \
             Return only the translation.",
            target_language
        );
        self.chat(&system, text).await
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: i64,
}
