use async_stream::try_stream;
use briefing_core::{BackendConfig, GenerationChunk};
use briefing_logging::briefing_warn;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::frames::{FrameError, NdjsonDecoder};
use super::{send_checked, GenerationError};

/// Ollama `/api/chat`, streamed as newline-delimited JSON.
///
/// Ollama occasionally emits lines that are not valid JSON; those are logged
/// and skipped instead of failing the generation.
#[derive(Clone)]
pub struct Ollama {
    client: Client,
    config: BackendConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatFrame {
    #[serde(default)]
    message: Option<FrameMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct FrameMessage {
    #[serde(default)]
    content: String,
}

impl Ollama {
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
            stream: true,
            options: Options {
                temperature: self.config.temperature,
                num_predict: self.config.max_output_tokens,
            },
        };
        let request = self
            .client
            .post(format!("{}/api/chat", self.config.endpoint()))
            .json(&body);

        try_stream! {
            let response = send_checked(request).await?;
            let mut bytes = response.bytes_stream();
            let mut decoder = NdjsonDecoder::default();
            let mut ended = false;
            while !ended {
                let frames: Vec<Result<ChatFrame, FrameError>> = match bytes.next().await {
                    Some(next) => decoder.push(&next?),
                    None => {
                        ended = true;
                        decoder.finish().into_iter().collect()
                    }
                };
                for frame in frames {
                    let frame = match frame {
                        Ok(frame) => frame,
                        Err(err) => {
                            briefing_warn!(
                                "Skipping malformed Ollama frame ({}): {}",
                                err.message,
                                err.record
                            );
                            continue;
                        }
                    };
                    if let Some(message) = frame.error {
                        Err::<(), _>(GenerationError::Backend(message))?;
                    }
                    let content = frame.message.map(|m| m.content).unwrap_or_default();
                    if frame.done {
                        yield GenerationChunk::last(content);
                        return;
                    }
                    yield GenerationChunk::partial(content);
                }
            }
            Err::<(), _>(GenerationError::Incomplete)?;
        }
    }
}
