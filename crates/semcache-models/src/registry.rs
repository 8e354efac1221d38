use std::collections::HashMap;
use std::sync::Arc;

use semcache_core::{ChatProvider, SemcacheError};
use serde::{Deserialize, Serialize};

use crate::backend::ProviderBackend;
use crate::mistral::{MistralConfig, MistralProvider};
use crate::openai::{OpenAiConfig, OpenAiProvider};

/// API key and optional endpoint override for one vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// Which built-in providers to register, and with what credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mistral: Option<ProviderCredentials>,
}

impl ProvidersConfig {
    /// Read `OPENAI_API_KEY` and `MISTRAL_API_KEY` from the environment.
    /// Unset or empty variables leave the provider unconfigured.
    pub fn from_env() -> Self {
        let key = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|k| !k.is_empty())
                .map(ProviderCredentials::new)
        };
        Self {
            openai: key("OPENAI_API_KEY"),
            mistral: key("MISTRAL_API_KEY"),
        }
    }

    /// Fill in vendors missing from `self` with those present in `other`.
    pub fn or(self, other: ProvidersConfig) -> Self {
        Self {
            openai: self.openai.or(other.openai),
            mistral: self.mistral.or(other.mistral),
        }
    }
}

/// Providers addressable by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in providers named in `config`, all sharing `backend`.
    pub fn from_config(config: &ProvidersConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        let mut registry = Self::new();
        if let Some(creds) = &config.openai {
            let mut cfg = OpenAiConfig::new(creds.api_key.clone());
            if let Some(url) = &creds.base_url {
                cfg = cfg.with_base_url(url.clone());
            }
            registry.register(Arc::new(OpenAiProvider::new(cfg, backend.clone())));
        }
        if let Some(creds) = &config.mistral {
            let mut cfg = MistralConfig::new(creds.api_key.clone());
            if let Some(url) = &creds.base_url {
                cfg = cfg.with_base_url(url.clone());
            }
            registry.register(Arc::new(MistralProvider::new(cfg, backend)));
        }
        registry
    }

    /// Register a provider under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) -> &mut Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    pub fn with(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ChatProvider>, SemcacheError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| SemcacheError::UnknownProvider(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
