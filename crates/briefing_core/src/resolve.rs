use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::job::non_blank;
use crate::{BackendConfig, CustomConfig, ProviderKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderConfigError {
    #[error(
        "API key not found for provider {provider}. Please set {var} environment variable or provide a custom API key."
    )]
    MissingCredential {
        provider: ProviderKind,
        var: &'static str,
    },
    #[error(
        "No LLM providers configured. Please set at least one provider's API key in environment variables."
    )]
    NoProviderConfigured,
}

/// Read-only view of credential configuration.
pub trait CredentialSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads credentials from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed credential map.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    vars: BTreeMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Turns a requested provider plus credentials into a [`BackendConfig`].
///
/// Resolution is a pure function of the arguments, the credential source and
/// the configured endpoint overrides.
#[derive(Clone)]
pub struct ProviderResolver {
    credentials: Arc<dyn CredentialSource>,
    endpoints: BTreeMap<ProviderKind, String>,
}

impl ProviderResolver {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            credentials,
            endpoints: BTreeMap::new(),
        }
    }

    /// Replaces the built-in base endpoint of `provider`.
    pub fn with_base_endpoint(mut self, provider: ProviderKind, endpoint: impl Into<String>) -> Self {
        self.endpoints.insert(provider, endpoint.into());
        self
    }

    /// Providers whose credential is present, in enumeration order.
    pub fn available_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.credential(kind.credential_var()).is_some())
            .collect()
    }

    /// The preferred provider if configured, else the first configured one.
    pub fn default_provider(&self) -> Result<ProviderKind, ProviderConfigError> {
        let available = self.available_providers();
        if available.contains(&ProviderKind::PREFERRED) {
            return Ok(ProviderKind::PREFERRED);
        }
        available
            .first()
            .copied()
            .ok_or(ProviderConfigError::NoProviderConfigured)
    }

    pub fn resolve(
        &self,
        requested: Option<ProviderKind>,
        custom: Option<&CustomConfig>,
    ) -> Result<BackendConfig, ProviderConfigError> {
        if let Some(custom) = custom {
            if let Some(api_key) = custom.api_key() {
                let provider = requested.unwrap_or(ProviderKind::PREFERRED);
                return Ok(self.build(provider, api_key.to_string(), custom.model()));
            }
        }

        let provider = match requested {
            Some(provider) => provider,
            None => self.default_provider()?,
        };
        let var = provider.credential_var();
        let api_key = self
            .credential(var)
            .ok_or(ProviderConfigError::MissingCredential { provider, var })?;
        let model = self.credential(provider.model_var());
        Ok(self.build(provider, api_key, model.as_deref()))
    }

    fn build(&self, provider: ProviderKind, api_key: String, model: Option<&str>) -> BackendConfig {
        let defaults = provider.defaults();
        let base_endpoint = self
            .endpoints
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| defaults.base_endpoint.to_string());
        BackendConfig {
            provider,
            api_key,
            model: model.unwrap_or(defaults.model).to_string(),
            base_endpoint: Some(base_endpoint),
            temperature: defaults.temperature,
            max_output_tokens: defaults.max_output_tokens,
            is_custom_model: model.is_some(),
        }
    }

    fn credential(&self, name: &str) -> Option<String> {
        let value = self.credentials.var(name)?;
        non_blank(Some(value.as_str())).map(|v| v.trim().to_string())
    }
}
