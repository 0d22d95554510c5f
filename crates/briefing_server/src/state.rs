use std::path::PathBuf;
use std::sync::Arc;

use briefing_core::{CredentialSource, ProviderResolver};
use briefing_engine::{
    ensure_output_dir, AudioStore, ContentCollector, ContentSource, ElevenLabsSynthesizer,
    FirecrawlSource, HtmlPageSource, Orchestrator, PersistError,
};
use briefing_logging::briefing_info;
use thiserror::Error;

use crate::config::{ConfigError, ServerConfig};

pub const ELEVENLABS_KEY_VAR: &str = "ELEVENLABS_API_KEY";
pub const FIRECRAWL_KEY_VAR: &str = "FIRECRAWL_API_KEY";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0} is not set; it is required for speech synthesis")]
    MissingCredential(&'static str),
    #[error(transparent)]
    PublicDir(#[from] PersistError),
}

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) orchestrator: Orchestrator,
    pub(crate) public_dir: PathBuf,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, public_dir: PathBuf) -> Self {
        Self {
            orchestrator,
            public_dir,
        }
    }

    /// Wires the production collaborators from config and process credentials.
    ///
    /// Only the speech and scraper keys are read here; provider keys are
    /// looked up per job.
    pub fn from_config(
        config: &ServerConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, StartupError> {
        ensure_output_dir(&config.public_dir)?;
        let client = reqwest::Client::new();

        let source: Arc<dyn ContentSource> = match present(credentials.var(FIRECRAWL_KEY_VAR)) {
            Some(key) => {
                briefing_info!("Collecting content through Firecrawl");
                Arc::new(
                    FirecrawlSource::new(client.clone(), key)
                        .with_base_url(config.firecrawl_base_url.clone()),
                )
            }
            None => {
                briefing_info!("Collecting content with the built-in page fetcher");
                Arc::new(HtmlPageSource::new(config.fetch.to_settings()))
            }
        };

        let speech_key = present(credentials.var(ELEVENLABS_KEY_VAR))
            .ok_or(StartupError::MissingCredential(ELEVENLABS_KEY_VAR))?;
        let synthesizer = ElevenLabsSynthesizer::new(client.clone(), speech_key)
            .with_base_url(config.elevenlabs_base_url.clone())
            .with_voice(config.voice_id.clone(), config.tts_model.clone());

        let mut resolver = ProviderResolver::new(credentials);
        for (provider, endpoint) in config.provider_endpoints()? {
            briefing_info!("Using {} for {}", endpoint, provider);
            resolver = resolver.with_base_endpoint(provider, endpoint);
        }

        let orchestrator = Orchestrator::new(
            client,
            ContentCollector::new(source),
            resolver,
            Arc::new(synthesizer),
            AudioStore::new(config.public_dir.clone()),
        )
        .with_prompt_templates(config.prompts.clone());

        Ok(Self::new(orchestrator, config.public_dir.clone()))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
