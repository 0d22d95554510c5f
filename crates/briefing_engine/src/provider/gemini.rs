use async_stream::try_stream;
use briefing_core::{BackendConfig, GenerationChunk};
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::frames::SseDecoder;
use super::{send_checked, GenerationError};

/// Model turn placed after the system prompt, which Gemini chats cannot carry natively.
pub const GEMINI_ACKNOWLEDGEMENT: &str = "I understand and will follow these instructions.";

/// Gemini `streamGenerateContent` over SSE.
///
/// The native stream only carries text deltas, so the final chunk is
/// synthesized once it is exhausted.
#[derive(Clone)]
pub struct Gemini {
    client: Client,
    config: BackendConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 3],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateFrame {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<FrameError>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct FrameError {
    message: String,
}

impl Gemini {
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
        let body = GenerateRequest {
            contents: [
                Content {
                    role: "user",
                    parts: [Part {
                        text: system_prompt,
                    }],
                },
                Content {
                    role: "model",
                    parts: [Part {
                        text: GEMINI_ACKNOWLEDGEMENT,
                    }],
                },
                Content {
                    role: "user",
                    parts: [Part { text: user_prompt }],
                },
            ],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.endpoint(),
            self.config.model
        );
        let request = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body);

        try_stream! {
            let response = send_checked(request).await?;
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            while let Some(next) = bytes.next().await {
                for payload in decoder.push(&next?) {
                    yield GenerationChunk::partial(parse_frame(&payload)?);
                }
            }
            if let Some(payload) = decoder.finish() {
                yield GenerationChunk::partial(parse_frame(&payload)?);
            }
            yield GenerationChunk::last("");
        }
    }
}

/// Text of the first candidate, all parts joined.
fn parse_frame(payload: &str) -> Result<String, GenerationError> {
    let frame: GenerateFrame = serde_json::from_str(payload.trim())
        .map_err(|err| GenerationError::Decode(format!("{err}: {payload}")))?;
    if let Some(error) = frame.error {
        return Err(GenerationError::Backend(error.message));
    }
    Ok(frame
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default())
}
