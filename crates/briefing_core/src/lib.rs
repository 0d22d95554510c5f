//! Briefing core: domain types, provider resolution and the pure pipeline state machine.
mod content;
mod effect;
mod error;
mod event;
mod job;
mod msg;
mod prompt;
mod provider;
mod resolve;
mod state;
mod update;

pub use content::{aggregate, ContentFragment};
pub use effect::Effect;
pub use error::PipelineError;
pub use event::{ProgressEvent, WireError};
pub use job::{normalize_url_for_dedupe, CustomConfig, Job, JobError, JobRequest};
pub use msg::Msg;
pub use prompt::{
    build_prompts, PromptPair, PromptTemplates, DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT,
};
pub use provider::{BackendConfig, GenerationChunk, ProviderDefaults, ProviderKind};
pub use resolve::{
    CredentialSource, EnvCredentials, ProviderConfigError, ProviderResolver, StaticCredentials,
};
pub use state::{JobState, Stage};
pub use update::update;
