use crate::{BackendConfig, ContentFragment, GenerationChunk, ProviderConfigError};

/// Inputs to the pipeline state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Job accepted; begin collecting content.
    Start,
    /// Every URL fetch has settled, in input order.
    FetchesSettled(Vec<ContentFragment>),
    /// Provider resolution finished.
    ProviderResolved(Result<BackendConfig, ProviderConfigError>),
    /// Next chunk from the generation stream.
    ChunkReceived(GenerationChunk),
    /// The generation stream failed.
    GenerationFailed(String),
    /// The generation stream ended without a final chunk.
    GenerationExhausted,
    /// Synthesis finished with the stored audio file name or an error message.
    SynthesisFinished(Result<String, String>),
    /// The caller went away.
    Cancelled,
}
