//! CLI command implementations
//!
//! This module contains all jobmatch CLI command implementations, plus the
//! glue that turns a loaded [`JobmatchConfig`] into search components.

pub mod config;
pub mod index;
pub mod search;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use jobmatch_config::{ConfigLoader, JobmatchConfig, StoreBackend};
use jobmatch_search::{
    create_classifier, create_provider, ClassificationProvider, Corpus, EmbeddingConfig,
    EmbeddingProvider, FilterMode, HttpSettings,
    HuggingFaceClassifierConfig, HuggingFaceEmbedderConfig, InMemoryVectorStore, OpenAIConfig,
    QdrantConfig, QdrantStore, QueryOrchestrator, VectorStore,
};

use crate::GlobalOptions;

/// Load configuration with optional config file override.
///
/// An explicit `--config` file replaces the global/local merge. CLI overrides
/// apply on top either way, and the result is validated.
pub fn load_config(global: &GlobalOptions) -> Result<JobmatchConfig> {
    let overrides = global.to_config_overrides();
    let mut loader = ConfigLoader::new();

    let config = if let Some(ref config_path) = global.config {
        if !config_path.exists() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        }
        let mut config = loader
            .load_file(config_path)
            .context("Failed to load config file")?;
        config.apply_overrides(&overrides);
        config
    } else {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        loader
            .load(&cwd, Some(&overrides))
            .context("Failed to load configuration")?
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Translate the config crate's filter mode into the search crate's.
pub fn filter_mode(config: &JobmatchConfig) -> FilterMode {
    match config.search.filter_mode {
        jobmatch_config::FilterMode::Diagnostic => FilterMode::Diagnostic,
        jobmatch_config::FilterMode::PostFilter => FilterMode::PostFilter,
    }
}

/// Convert jobmatch_config's embedding settings to jobmatch_search's EmbeddingConfig.
///
/// Credentials are resolved from the environment variables the config names.
pub fn to_search_embedding_config(config: &JobmatchConfig) -> Result<EmbeddingConfig> {
    match config.embedding.provider {
        jobmatch_config::EmbeddingProviderType::HuggingFace => {
            let hf = &config.embedding.huggingface;
            let api_key = hf.resolve_api_key()?;
            Ok(EmbeddingConfig::huggingface(HuggingFaceEmbedderConfig {
                base_url: hf.url.clone(),
                api_key: Some(api_key),
                model: hf.model.clone(),
                wait_for_model: hf.wait_for_model,
                http: HttpSettings {
                    timeout_secs: hf.timeout_secs,
                    max_retries: hf.max_retries,
                    ..HttpSettings::default()
                },
            }))
        }
        jobmatch_config::EmbeddingProviderType::Openai => {
            let openai = config
                .embedding
                .openai
                .as_ref()
                .context("embedding.provider is 'openai' but [embedding.openai] is missing")?;
            Ok(EmbeddingConfig::openai(OpenAIConfig {
                base_url: openai.url.clone(),
                api_key: openai.api_key(),
                model: openai.model.clone(),
                azure_mode: openai.azure_mode,
                http: HttpSettings {
                    timeout_secs: openai.timeout_secs,
                    max_retries: openai.max_retries,
                    ..HttpSettings::default()
                },
            }))
        }
    }
}

/// Convert the classification settings to the classifier config.
pub fn to_classifier_config(config: &JobmatchConfig) -> Result<HuggingFaceClassifierConfig> {
    let settings = &config.classification;
    let api_key = settings.resolve_api_key()?;
    Ok(HuggingFaceClassifierConfig {
        base_url: settings.url.clone(),
        api_key: Some(api_key),
        model: settings.model.clone(),
        wait_for_model: settings.wait_for_model,
        http: HttpSettings {
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
            ..HttpSettings::default()
        },
    })
}

pub fn build_embedder(config: &JobmatchConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let search_config = to_search_embedding_config(config)?;
    create_provider(&search_config).context("Failed to create embedding provider")
}

pub fn build_classifier(config: &JobmatchConfig) -> Result<Arc<dyn ClassificationProvider>> {
    let classifier_config = to_classifier_config(config)?;
    create_classifier(&classifier_config).context("Failed to create classification provider")
}

/// Open the configured vector store.
pub async fn build_store(config: &JobmatchConfig) -> Result<Arc<dyn VectorStore>> {
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
        StoreBackend::Qdrant => Ok(Arc::new(connect_qdrant(config).await?)),
    }
}

pub async fn connect_qdrant(config: &JobmatchConfig) -> Result<QdrantStore> {
    let settings = &config.store.qdrant;
    let mut qdrant = QdrantConfig::with_url(&settings.url);
    qdrant.timeout_secs = settings.timeout_secs;
    if let Some(key) = settings.api_key() {
        qdrant = qdrant.api_key(key);
    }
    QdrantStore::connect(qdrant)
        .await
        .with_context(|| format!("Failed to connect to Qdrant at {}", settings.url))
}

pub fn load_corpus(config: &JobmatchConfig) -> Result<Corpus> {
    Corpus::load(&config.corpus.path)
        .with_context(|| format!("Failed to load job postings from {}", config.corpus.path.display()))
}

/// Assemble a query orchestrator from configuration.
pub async fn create_orchestrator(config: &JobmatchConfig) -> Result<QueryOrchestrator> {
    let corpus = load_corpus(config)?;
    let embedder = build_embedder(config)?;
    let classifier = build_classifier(config)?;
    let store = build_store(config).await?;

    Ok(QueryOrchestrator::new(
        corpus,
        embedder,
        classifier,
        store,
        config.store.collection.clone(),
    )
    .with_filter_mode(filter_mode(config)))
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
