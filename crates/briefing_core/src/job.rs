use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{PromptTemplates, ProviderKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("at least one URL is required")]
    NoUrls,
    #[error("unsupported provider: {0}")]
    UnknownProvider(String),
}

/// Per-request credentials that bypass environment lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl CustomConfig {
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    pub fn model(&self) -> Option<&str> {
        non_blank(self.model.as_deref())
    }
}

/// Inbound request body for one briefing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub custom_config: Option<CustomConfig>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

impl JobRequest {
    pub fn into_job(self) -> Result<Job, JobError> {
        let provider = match non_blank(self.provider.as_deref()) {
            Some(name) => Some(name.parse::<ProviderKind>().map_err(JobError::UnknownProvider)?),
            None => None,
        };
        let job = Job::new(self.urls)?;
        Ok(Job {
            requested_provider: provider,
            prompt_overrides: PromptTemplates {
                system: self.system_prompt,
                user: self.user_prompt,
            },
            custom_config: self.custom_config,
            ..job
        })
    }
}

/// One accepted briefing request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    urls: Vec<String>,
    requested_provider: Option<ProviderKind>,
    prompt_overrides: PromptTemplates,
    custom_config: Option<CustomConfig>,
}

impl Job {
    /// Trims URLs, drops blank entries and duplicates (first occurrence wins).
    pub fn new<I, S>(urls: I) -> Result<Self, JobError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let urls: Vec<String> = urls
            .into_iter()
            .map(Into::into)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .filter(|url| seen.insert(normalize_url_for_dedupe(url)))
            .collect();
        if urls.is_empty() {
            return Err(JobError::NoUrls);
        }
        Ok(Self {
            urls,
            requested_provider: None,
            prompt_overrides: PromptTemplates::default(),
            custom_config: None,
        })
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.requested_provider = Some(provider);
        self
    }

    pub fn with_prompt_overrides(mut self, overrides: PromptTemplates) -> Self {
        self.prompt_overrides = overrides;
        self
    }

    pub fn with_custom_config(mut self, custom: CustomConfig) -> Self {
        self.custom_config = Some(custom);
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn requested_provider(&self) -> Option<ProviderKind> {
        self.requested_provider
    }

    pub fn prompt_overrides(&self) -> &PromptTemplates {
        &self.prompt_overrides
    }

    pub fn custom_config(&self) -> Option<&CustomConfig> {
        self.custom_config.as_ref()
    }
}

/// Comparison key for duplicate detection; unparsable input is compared verbatim.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            let mut normalized = url.to_string();
            if url.path() == "/" && url.query().is_none() {
                normalized = normalized.trim_end_matches('/').to_string();
            }
            normalized
        }
        Err(_) => raw.trim().to_string(),
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
