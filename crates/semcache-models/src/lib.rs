mod scripted;
pub use scripted::ScriptedProvider;

mod backend;
pub use backend::{FakeBackend, HttpBackend, ProviderBackend, ProviderRequest, ProviderResponse};

mod openai;
pub use openai::{OpenAiConfig, OpenAiProvider, OPENAI_BASE_URL};

mod mistral;
pub use mistral::{MistralConfig, MistralProvider, MISTRAL_BASE_URL};

mod registry;
pub use registry::{ProviderCredentials, ProviderRegistry, ProvidersConfig};

// Re-export the provider contract from core for convenience.
pub use semcache_core::{ChatProvider, ProviderError};
