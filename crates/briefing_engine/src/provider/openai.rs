use async_stream::try_stream;
use briefing_core::{BackendConfig, GenerationChunk};
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::frames::SseDecoder;
use super::{send_checked, GenerationError};

const DONE_SENTINEL: &str = "[DONE]";

/// Chat-completions API as spoken by OpenAI, Groq, Mistral and Anthropic's compatibility layer.
#[derive(Clone)]
pub struct OpenAiCompatible {
    client: Client,
    config: BackendConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionFrame {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiCompatible {
    pub fn new(client: Client, config: BackendConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub(super) fn stream(
        &self,
        user_prompt: &str,
        system_prompt: &str,
    ) -> impl Stream<Item = Result<GenerationChunk, GenerationError>> + Send + 'static {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_output_tokens,
            stream: true,
        };
        let request = self
            .client
            .post(format!("{}/chat/completions", self.config.endpoint()))
            .bearer_auth(&self.config.api_key)
            .json(&body);

        try_stream! {
            let response = send_checked(request).await?;
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            let mut ended = false;
            while !ended {
                let payloads = match bytes.next().await {
                    Some(next) => decoder.push(&next?),
                    None => {
                        ended = true;
                        decoder.finish().into_iter().collect()
                    }
                };
                for payload in payloads {
                    let chunk = parse_frame(&payload)?;
                    let is_final = chunk.is_final;
                    yield chunk;
                    if is_final {
                        return;
                    }
                }
            }
            Err::<(), _>(GenerationError::Incomplete)?;
        }
    }
}

/// One SSE payload to one chunk. `[DONE]` without a prior stop reason closes the stream.
fn parse_frame(payload: &str) -> Result<GenerationChunk, GenerationError> {
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Ok(GenerationChunk::last(""));
    }
    let frame: CompletionFrame = serde_json::from_str(payload)
        .map_err(|err| GenerationError::Decode(format!("{err}: {payload}")))?;
    if let Some(error) = frame.error {
        return Err(GenerationError::Backend(error.message));
    }
    let Some(choice) = frame.choices.into_iter().next() else {
        return Ok(GenerationChunk::partial(""));
    };
    let content = choice
        .delta
        .and_then(|delta| delta.content)
        .unwrap_or_default();
    Ok(GenerationChunk {
        content,
        is_final: choice.finish_reason.is_some(),
    })
}
