use crate::{BackendConfig, CustomConfig, ProgressEvent, PromptPair, ProviderKind};

/// Work requested by the state machine; the engine executes these in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Emit(ProgressEvent),
    CollectContent {
        urls: Vec<String>,
    },
    ResolveProvider {
        requested: Option<ProviderKind>,
        custom: Option<CustomConfig>,
    },
    StartGeneration {
        config: BackendConfig,
        prompts: PromptPair,
    },
    StopGeneration,
    Synthesize {
        transcript: String,
    },
}
