//! jobmatch Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.jobmatch/config.toml`
//! - Local config: `.jobmatch/config.toml` (in the working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.
//!
//! Secrets never live in config files. Settings name the environment variable
//! that holds a credential and the credential is resolved at startup.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Query used when the interactive prompt receives a blank line.
pub const DEFAULT_QUERY: &str = "Developer|Boston|Full-Time";

/// Environment variable holding the Hugging Face Inference token.
pub const DEFAULT_HF_API_KEY_ENV: &str = "HF_API_KEY";

/// Base URL for Hugging Face Inference models.
pub const DEFAULT_HF_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Root configuration for jobmatch.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobmatchConfig {
    /// Job posting source
    pub corpus: CorpusConfig,

    /// Vector store configuration
    pub store: StoreConfig,

    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,

    /// Zero-shot classification configuration
    pub classification: ClassificationConfig,

    /// Query handling configuration
    pub search: SearchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Job posting corpus location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// JSON file containing an array of job postings
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("job_postings.json"),
        }
    }
}

/// Vector store configuration.
///
/// # Example TOML
///
/// ```toml
/// [store]
/// backend = "qdrant"
/// collection = "job_collection"
///
/// [store.qdrant]
/// url = "http://localhost:6334"
/// api_key_env = "QDRANT_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which vector store backend to use
    pub backend: StoreBackend,

    /// Collection (namespace) holding the job embeddings
    pub collection: String,

    /// Qdrant connection settings (used when backend = "qdrant")
    pub qdrant: QdrantSettings,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            collection: "job_collection".to_string(),
            qdrant: QdrantSettings::default(),
        }
    }
}

/// Vector store backend selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, rebuilt on every run
    #[default]
    Memory,
    /// Qdrant vector database
    Qdrant,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Qdrant => write!(f, "qdrant"),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "qdrant" => Ok(Self::Qdrant),
            _ => Err(ConfigError::ValidationError(format!(
                "Unknown store backend: '{}'. Valid values: memory, qdrant",
                s
            ))),
        }
    }
}

/// Qdrant vector database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantSettings {
    /// Qdrant server URL
    pub url: String,

    /// Environment variable name containing the API key (optional)
    pub api_key_env: Option<String>,

    /// Connection timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key_env: None,
            timeout_secs: 30,
        }
    }
}

impl QdrantSettings {
    /// Resolve the API key, if one is configured and present.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }
}

/// Embedding provider configuration.
///
/// # Example TOML
///
/// ```toml
/// [embedding]
/// provider = "huggingface"  # or "openai"
///
/// [embedding.huggingface]
/// model = "sentence-transformers/all-MiniLM-L6-v2"
/// api_key_env = "HF_API_KEY"
///
/// [embedding.openai]
/// url = "http://localhost:11434/v1"
/// model = "nomic-embed-text"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which embedding provider to use
    pub provider: EmbeddingProviderType,

    /// Hugging Face Inference settings
    pub huggingface: HuggingFaceSettings,

    /// OpenAI-compatible provider settings (required when provider = "openai")
    pub openai: Option<OpenAISettings>,
}

impl EmbeddingConfig {
    /// Validate that required settings exist for the selected provider.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.provider {
            EmbeddingProviderType::HuggingFace => {
                if self.huggingface.model.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "embedding.huggingface.model is required".to_string(),
                    ));
                }
                Ok(())
            }
            EmbeddingProviderType::Openai => {
                let Some(settings) = self.openai.as_ref() else {
                    return Err(ConfigError::ValidationError(
                        "embedding.provider is 'openai' but [embedding.openai] section is missing"
                            .to_string(),
                    ));
                };
                if settings.url.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "embedding.openai.url is required".to_string(),
                    ));
                }
                if settings.model.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "embedding.openai.model is required".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Embedding provider type selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    /// Hugging Face Inference feature extraction (default)
    #[default]
    HuggingFace,
    /// OpenAI-compatible API (OpenAI, Azure OpenAI, Ollama, etc.)
    Openai,
}

impl std::fmt::Display for EmbeddingProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HuggingFace => write!(f, "huggingface"),
            Self::Openai => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for EmbeddingProviderType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hugging-face" | "hf" => Ok(Self::HuggingFace),
            "openai" => Ok(Self::Openai),
            _ => Err(ConfigError::ValidationError(format!(
                "Unknown embedding provider: '{}'. Valid values: huggingface, openai",
                s
            ))),
        }
    }
}

/// Hugging Face Inference settings for feature extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceSettings {
    /// Inference base URL; the model id is appended
    pub url: String,

    /// Environment variable name containing the access token
    pub api_key_env: String,

    /// Sentence embedding model id
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retry attempts (0 = no retries)
    pub max_retries: u32,

    /// Ask the service to block until a cold model is loaded
    pub wait_for_model: bool,
}

impl Default for HuggingFaceSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_HF_URL.to_string(),
            api_key_env: DEFAULT_HF_API_KEY_ENV.to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            timeout_secs: 30,
            max_retries: 0,
            wait_for_model: true,
        }
    }
}

impl HuggingFaceSettings {
    /// Resolve the access token from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_credential("embedding", &self.api_key_env)
    }
}

/// OpenAI-compatible provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API base URL (e.g., "https://api.openai.com/v1")
    pub url: String,

    /// Environment variable name containing API key
    pub api_key_env: Option<String>,

    /// Embedding model
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retry attempts (0 = no retries)
    pub max_retries: u32,

    /// Use Azure OpenAI authentication (api-key header)
    pub azure_mode: bool,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            model: "text-embedding-3-small".to_string(),
            timeout_secs: 30,
            max_retries: 0,
            azure_mode: false,
        }
    }
}

impl OpenAISettings {
    /// Resolve the API key. Local servers such as Ollama need none.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }
}

/// Zero-shot classification settings.
///
/// # Example TOML
///
/// ```toml
/// [classification]
/// model = "facebook/bart-large-mnli"
/// api_key_env = "HF_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Inference base URL; the model id is appended
    pub url: String,

    /// Environment variable name containing the access token
    pub api_key_env: String,

    /// Zero-shot classification model id
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retry attempts (0 = no retries)
    pub max_retries: u32,

    /// Ask the service to block until a cold model is loaded
    pub wait_for_model: bool,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_HF_URL.to_string(),
            api_key_env: DEFAULT_HF_API_KEY_ENV.to_string(),
            model: "facebook/bart-large-mnli".to_string(),
            timeout_secs: 30,
            max_retries: 0,
            wait_for_model: true,
        }
    }
}

impl ClassificationConfig {
    /// Resolve the access token from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_credential("classification", &self.api_key_env)
    }
}

/// Query handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// How extracted filter criteria affect results
    pub filter_mode: FilterMode,

    /// Query used when the prompt receives a blank line
    pub default_query: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::default(),
            default_query: DEFAULT_QUERY.to_string(),
        }
    }
}

/// Filter criteria enforcement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Criteria are reported but do not constrain results
    #[default]
    Diagnostic,
    /// Results not matching every extracted criterion are dropped
    PostFilter,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override corpus file
    pub corpus_path: Option<PathBuf>,

    /// Override store backend
    pub store_backend: Option<StoreBackend>,

    /// Override Qdrant URL
    pub qdrant_url: Option<String>,

    /// Override embedding provider type
    pub embedding_provider: Option<EmbeddingProviderType>,

    /// Override filter mode
    pub filter_mode: Option<FilterMode>,

    /// Override log level
    pub log_level: Option<String>,
}

impl JobmatchConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref path) = overrides.corpus_path {
            self.corpus.path = path.clone();
        }

        if let Some(backend) = overrides.store_backend {
            self.store.backend = backend;
        }

        if let Some(ref url) = overrides.qdrant_url {
            self.store.qdrant.url = url.clone();
        }

        if let Some(provider) = overrides.embedding_provider {
            self.embedding.provider = provider;
        }

        if let Some(mode) = overrides.filter_mode {
            self.search.filter_mode = mode;
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    ///
    /// Checks that all required settings exist for the selected providers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.collection is required".to_string(),
            ));
        }
        if self.classification.model.is_empty() {
            return Err(ConfigError::ValidationError(
                "classification.model is required".to_string(),
            ));
        }
        if self.search.default_query.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "search.default_query must not be blank".to_string(),
            ));
        }
        self.embedding.validate()?;
        Ok(())
    }
}

/// Read a required credential from the environment.
fn resolve_credential(purpose: &str, env_var: &str) -> Result<String, ConfigError> {
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::missing_credential(purpose, env_var)),
    }
}
