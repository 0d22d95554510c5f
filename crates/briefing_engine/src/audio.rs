use std::path::PathBuf;
use std::sync::Arc;

use briefing_logging::briefing_info;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;

use crate::filename::audio_file_name;
use crate::persist::AtomicFileWriter;
use crate::{AudioStream, AudioSynthesisError};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Stores synthesized audio in the public directory under a timestamp name.
#[derive(Clone)]
pub struct AudioStore {
    writer: AtomicFileWriter,
    clock: Clock,
}

impl AudioStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Drains the stream and writes it out; returns the file name, not the full path.
    pub async fn save(&self, mut audio: AudioStream) -> Result<String, AudioSynthesisError> {
        let mut buffer = Vec::new();
        while let Some(chunk) = audio.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        if buffer.is_empty() {
            return Err(AudioSynthesisError::Empty);
        }

        let file_name = audio_file_name((self.clock)());
        let path = self.writer.write(&file_name, &buffer)?;
        briefing_info!("Audio file saved: {:?} ({} bytes)", path, buffer.len());
        Ok(file_name)
    }

    pub fn dir(&self) -> &std::path::Path {
        self.writer.dir()
    }
}
