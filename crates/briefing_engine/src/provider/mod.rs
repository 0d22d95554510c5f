//! Text-generation backends behind one streaming contract.
//!
//! Every variant turns a prompt pair into a [`ChunkStream`]: a pull-based
//! sequence of [`GenerationChunk`]s that ends with exactly one chunk whose
//! `is_final` is set, or with an error. Chunks already yielded stay valid when
//! a later error ends the stream.

pub mod frames;
mod gemini;
mod ollama;
mod openai;

use std::pin::Pin;

use briefing_core::{BackendConfig, GenerationChunk, ProviderKind};
use futures_core::Stream;
use reqwest::{Client, RequestBuilder, Response};
use thiserror::Error;

pub use gemini::{Gemini, GEMINI_ACKNOWLEDGEMENT};
pub use ollama::Ollama;
pub use openai::OpenAiCompatible;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerationChunk, GenerationError>> + Send>>;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed frame: {0}")]
    Decode(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("stream ended before completion")]
    Incomplete,
}

/// Closed set of backend families; pick one with [`TextGenerator::from_config`].
#[derive(Clone)]
pub enum TextGenerator {
    OpenAiCompatible(OpenAiCompatible),
    Gemini(Gemini),
    Ollama(Ollama),
}

impl TextGenerator {
    pub fn from_config(client: Client, config: &BackendConfig) -> Self {
        match config.provider {
            ProviderKind::Groq
            | ProviderKind::OpenAi
            | ProviderKind::Anthropic
            | ProviderKind::Mistral => {
                TextGenerator::OpenAiCompatible(OpenAiCompatible::new(client, config.clone()))
            }
            ProviderKind::Gemini => TextGenerator::Gemini(Gemini::new(client, config.clone())),
            ProviderKind::Ollama => TextGenerator::Ollama(Ollama::new(client, config.clone())),
        }
    }

    pub fn provider(&self) -> ProviderKind {
        match self {
            TextGenerator::OpenAiCompatible(backend) => backend.config().provider,
            TextGenerator::Gemini(backend) => backend.config().provider,
            TextGenerator::Ollama(backend) => backend.config().provider,
        }
    }

    /// Starts one generation. Nothing is sent until the stream is first polled.
    pub fn generate(&self, user_prompt: &str, system_prompt: &str) -> ChunkStream {
        match self {
            TextGenerator::OpenAiCompatible(backend) => {
                Box::pin(backend.stream(user_prompt, system_prompt))
            }
            TextGenerator::Gemini(backend) => Box::pin(backend.stream(user_prompt, system_prompt)),
            TextGenerator::Ollama(backend) => Box::pin(backend.stream(user_prompt, system_prompt)),
        }
    }
}

const MAX_ERROR_BODY: usize = 512;

async fn send_checked(request: RequestBuilder) -> Result<Response, GenerationError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(GenerationError::Status {
        status: status.as_u16(),
        body,
    })
}
