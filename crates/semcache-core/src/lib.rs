use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod validation;

pub use validation::{parse_conversation, validate, validate_conversation};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The author of a message. Parsed case-insensitively, always stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Normalize a wire role name. Returns `None` for anything outside
    /// `system`, `user` and `assistant`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Whether a conversation may start with this role.
    pub fn can_open_conversation(&self) -> bool {
        matches!(self, Role::System | Role::User)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A validated chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An unvalidated message as it arrives from a caller. Either field may be
/// absent; `validate` decides whether the conversation is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RawMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            content: Some(content.into()),
        }
    }
}

impl From<&Message> for RawMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role.as_str(), message.content.clone())
    }
}

// ---------------------------------------------------------------------------
// Completion request
// ---------------------------------------------------------------------------

/// A conversation addressed to a named provider and model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub provider: String,
    pub model: String,
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            messages,
        }
    }

    /// Build a request from untyped messages, running the full validator.
    pub fn from_raw(
        provider: impl Into<String>,
        model: impl Into<String>,
        messages: &[RawMessage],
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(provider, model, parse_conversation(messages)?))
    }

    /// Content of the final message, the default cache key.
    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().map(Message::content)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A structurally invalid conversation. Raised before any cache or provider I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("conversation must contain at least one message")]
    EmptyConversation,
    #[error("message {index} is missing the '{field}' field")]
    MissingField { index: usize, field: &'static str },
    #[error("message {index} has role '{role}', expected one of system, user, assistant")]
    InvalidRole { index: usize, role: String },
    #[error("conversation must start with a system or user message, found '{role}'")]
    InvalidFirstRole { role: Role },
}

/// Failure reported by a text-generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("quota exceeded: {0}")]
    Quota(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Response(String),
}

/// Unified error type for Semcache.
#[derive(Debug, Error)]
pub enum SemcacheError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("vector store error: {0}")]
    VectorStore(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("config error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// ChatProvider trait
// ---------------------------------------------------------------------------

/// A remote text-generation backend. One implementation per vendor.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Registry name, e.g. `"openai"`.
    fn name(&self) -> &str;

    async fn generate(&self, model: &str, messages: &[Message]) -> Result<String, ProviderError>;
}

// ---------------------------------------------------------------------------
// Embeddings trait
// ---------------------------------------------------------------------------

/// Trait for text embedding providers.
#[async_trait]
pub trait Embeddings: Send + Sync {
    /// Embed multiple texts (for indexing).
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemcacheError>;

    /// Embed a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SemcacheError>;
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An indexed text together with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: HashMap<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }
}

// ---------------------------------------------------------------------------
// VectorStore trait
// ---------------------------------------------------------------------------

/// Nearest-neighbour storage for cache keys. Implementations own embedding,
/// indexing and persistence.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Index `text` with opaque metadata, returning the new entry's id.
    async fn index(
        &self,
        text: &str,
        metadata: HashMap<String, Value>,
    ) -> Result<String, SemcacheError>;

    /// Up to `k` nearest entries with similarity scores, highest first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<(Document, f32)>, SemcacheError>;

    /// Whether an entry with exactly this text is live.
    async fn contains(&self, text: &str) -> Result<bool, SemcacheError>;

    /// Number of live entries.
    async fn count(&self) -> Result<usize, SemcacheError>;

    /// Remove every entry, vector and metadata.
    async fn clear(&self) -> Result<(), SemcacheError>;
}
