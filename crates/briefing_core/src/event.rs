use serde::{Deserialize, Serialize};

pub type WireError = serde_json::Error;

/// Progress reported to the caller while a job runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Update {
        message: String,
    },
    Content {
        content: String,
    },
    Complete {
        #[serde(rename = "audioFileName")]
        audio_file_name: String,
    },
    Error {
        message: String,
    },
}

impl ProgressEvent {
    pub fn update(message: impl Into<String>) -> Self {
        ProgressEvent::Update {
            message: message.into(),
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        ProgressEvent::Content {
            content: content.into(),
        }
    }

    pub fn complete(audio_file_name: impl Into<String>) -> Self {
        ProgressEvent::Complete {
            audio_file_name: audio_file_name.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }

    /// Complete and Error end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }

    /// Encodes the event as one `data: <json>\n\n` event-stream frame.
    pub fn to_frame(&self) -> Result<String, WireError> {
        let json = serde_json::to_string(self)?;
        Ok(format!("data: {json}\n\n"))
    }
}
