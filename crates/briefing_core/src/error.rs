use thiserror::Error;

use crate::ProviderConfigError;

/// Job-fatal failures. Each one ends the job with a single error event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("No content could be scraped")]
    NoContent,
    #[error(transparent)]
    ProviderConfig(#[from] ProviderConfigError),
    #[error("Text generation failed: {0}")]
    GenerationStream(String),
    #[error("Audio synthesis failed: {0}")]
    AudioSynthesis(String),
    #[error("Job cancelled")]
    Cancelled,
}
