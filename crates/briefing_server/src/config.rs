use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use briefing_core::{PromptTemplates, ProviderKind};
use briefing_engine::{
    FetchSettings, DEFAULT_TTS_MODEL, DEFAULT_VOICE_ID, ELEVENLABS_BASE_URL, FIRECRAWL_BASE_URL,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("unknown provider {0:?} in endpoints")]
    UnknownProvider(String),
}

/// Server settings, read from a RON file. Every field has a default, so an
/// empty `()` document is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Where finished audio is written and served from.
    pub public_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub voice_id: String,
    pub tts_model: String,
    pub elevenlabs_base_url: String,
    pub firecrawl_base_url: String,
    pub prompts: PromptTemplates,
    /// Base endpoint overrides keyed by provider name, e.g. `"ollama"`.
    pub endpoints: BTreeMap<String, String>,
    pub fetch: FetchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            public_dir: PathBuf::from("public"),
            log_level: "info".to_string(),
            log_file: None,
            voice_id: DEFAULT_VOICE_ID.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            elevenlabs_base_url: ELEVENLABS_BASE_URL.to_string(),
            firecrawl_base_url: FIRECRAWL_BASE_URL.to_string(),
            prompts: PromptTemplates::default(),
            endpoints: BTreeMap::new(),
            fetch: FetchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
        }
    }
}

impl FetchConfig {
    pub fn to_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            ..FetchSettings::default()
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.provider_endpoints()?;
        Ok(config)
    }

    /// Endpoint overrides with provider names parsed.
    pub fn provider_endpoints(&self) -> Result<Vec<(ProviderKind, String)>, ConfigError> {
        self.endpoints
            .iter()
            .map(|(name, url)| {
                name.parse::<ProviderKind>()
                    .map(|kind| (kind, url.clone()))
                    .map_err(|_| ConfigError::UnknownProvider(name.clone()))
            })
            .collect()
    }
}
