use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Text-generation backends, in the order used when picking a fallback default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    OpenAi,
    Anthropic,
    Mistral,
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Groq,
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Mistral,
        ProviderKind::Gemini,
        ProviderKind::Ollama,
    ];

    /// Provider used when a job does not ask for one and its credential is present.
    pub const PREFERRED: ProviderKind = ProviderKind::Groq;

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Mistral => "mistral",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Environment variable holding the API key.
    pub fn credential_var(self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Mistral => "MISTRAL_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Ollama => "OLLAMA_API_KEY",
        }
    }

    /// Environment variable holding an optional model override.
    pub fn model_var(self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_MODEL",
            ProviderKind::OpenAi => "OPENAI_MODEL",
            ProviderKind::Anthropic => "ANTHROPIC_MODEL",
            ProviderKind::Mistral => "MISTRAL_MODEL",
            ProviderKind::Gemini => "GEMINI_MODEL",
            ProviderKind::Ollama => "OLLAMA_MODEL",
        }
    }

    pub fn defaults(self) -> ProviderDefaults {
        let (model, base_endpoint) = match self {
            ProviderKind::Groq => (
                "deepseek-r1-distill-qwen-32b",
                "https://api.groq.com/openai/v1",
            ),
            ProviderKind::OpenAi => ("gpt-4-turbo-preview", "https://api.openai.com/v1"),
            ProviderKind::Anthropic => ("claude-3-opus-20240229", "https://api.anthropic.com/v1"),
            ProviderKind::Mistral => ("mistral-large-latest", "https://api.mistral.ai/v1"),
            ProviderKind::Gemini => (
                "gemini-pro",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            ProviderKind::Ollama => ("llama2", "http://localhost:11434"),
        };
        ProviderDefaults {
            model,
            base_endpoint,
            temperature: 0.7,
            max_output_tokens: 2000,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| wanted.to_string())
    }
}

/// Built-in settings for a provider before credentials and overrides are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderDefaults {
    pub model: &'static str,
    pub base_endpoint: &'static str,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Fully resolved backend settings for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
    pub base_endpoint: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub is_custom_model: bool,
}

impl BackendConfig {
    /// Endpoint to talk to, falling back to the provider default.
    pub fn endpoint(&self) -> &str {
        self.base_endpoint
            .as_deref()
            .unwrap_or(self.provider.defaults().base_endpoint)
            .trim_end_matches('/')
    }
}

/// One increment of generated text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationChunk {
    pub content: String,
    pub is_final: bool,
}

impl GenerationChunk {
    pub fn partial(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: false,
        }
    }

    pub fn last(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_final: true,
        }
    }
}
