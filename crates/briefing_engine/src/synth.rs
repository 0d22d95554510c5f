use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{header, Client};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioSynthesisError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("speech service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("speech service returned no audio")]
    Empty,
    #[error("could not store audio: {0}")]
    Store(#[from] crate::PersistError),
}

pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes, AudioSynthesisError>> + Send>>;

/// Text to audio bytes.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, AudioSynthesisError>;
}

pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
/// ElevenLabs "Rachel".
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8EAFYa";
pub const DEFAULT_TTS_MODEL: &str = "eleven_turbo_v2";

pub struct ElevenLabsSynthesizer {
    client: Client,
    api_key: String,
    base_url: String,
    voice_id: String,
    model_id: String,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsSynthesizer {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: ELEVENLABS_BASE_URL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_TTS_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self.model_id = model_id.into();
        self
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, AudioSynthesisError> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.base_url.trim_end_matches('/'),
            self.voice_id
        );
        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header(header::ACCEPT, "audio/mpeg")
            .json(&SpeechRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AudioSynthesisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(AudioSynthesisError::from)),
        ))
    }
}
