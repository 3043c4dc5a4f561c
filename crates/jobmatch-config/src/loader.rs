//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.jobmatch/config.toml`
//! 2. Local config: `.jobmatch/config.toml` (in the working directory)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{ConfigOverrides, JobmatchConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory name, used both under the home and working directory.
const CONFIG_DIR: &str = ".jobmatch";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.jobmatch`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<JobmatchConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.jobmatch`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a directory.
    pub fn local_config_path(&self, root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a directory with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides.
    pub fn load(
        &mut self,
        root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<JobmatchConfig, ConfigError> {
        let mut config = JobmatchConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        Ok(config)
    }

    /// Load a single explicit configuration file over the defaults.
    pub fn load_file(&self, path: &Path) -> Result<JobmatchConfig, ConfigError> {
        debug!("Loading config from {:?}", path);
        load_config_file(path)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<JobmatchConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a directory.
    pub fn load_local(&self, root: &Path) -> Result<Option<JobmatchConfig>, ConfigError> {
        let local_path = self.local_config_path(root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Initialize the global configuration file with defaults.
    ///
    /// Existing files are left untouched.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        init_config_file(&global_dir.join(CONFIG_FILE_NAME))
    }

    /// Initialize the local configuration file with defaults.
    ///
    /// Existing files are left untouched.
    pub fn init_local(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        init_config_file(&self.local_config_path(root))
    }

    /// Clear cached global configuration.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<JobmatchConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

fn init_config_file(path: &Path) -> Result<PathBuf, ConfigError> {
    if !path.exists() {
        save_config_file(path, &JobmatchConfig::default())?;
    }
    Ok(path.to_path_buf())
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &JobmatchConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// Overlay values that still equal the built-in default do not clobber the base,
/// so a partial local file only overrides what it mentions.
fn merge_configs(base: JobmatchConfig, overlay: JobmatchConfig) -> JobmatchConfig {
    JobmatchConfig {
        corpus: merge_corpus(base.corpus, overlay.corpus),
        store: merge_store(base.store, overlay.store),
        embedding: merge_embedding(base.embedding, overlay.embedding),
        classification: merge_classification(base.classification, overlay.classification),
        search: merge_search(base.search, overlay.search),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

/// Pick the overlay value unless it is the default.
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

fn merge_corpus(base: crate::CorpusConfig, overlay: crate::CorpusConfig) -> crate::CorpusConfig {
    let default = crate::CorpusConfig::default();
    crate::CorpusConfig {
        path: pick(base.path, overlay.path, default.path),
    }
}

fn merge_store(base: crate::StoreConfig, overlay: crate::StoreConfig) -> crate::StoreConfig {
    let default = crate::StoreConfig::default();
    crate::StoreConfig {
        backend: pick(base.backend, overlay.backend, default.backend),
        collection: pick(base.collection, overlay.collection, default.collection),
        qdrant: crate::QdrantSettings {
            url: pick(base.qdrant.url, overlay.qdrant.url, default.qdrant.url),
            api_key_env: overlay.qdrant.api_key_env.or(base.qdrant.api_key_env),
            timeout_secs: pick(
                base.qdrant.timeout_secs,
                overlay.qdrant.timeout_secs,
                default.qdrant.timeout_secs,
            ),
        },
    }
}

fn merge_embedding(
    base: crate::EmbeddingConfig,
    overlay: crate::EmbeddingConfig,
) -> crate::EmbeddingConfig {
    let default = crate::HuggingFaceSettings::default();
    let (b, o) = (base.huggingface, overlay.huggingface);
    crate::EmbeddingConfig {
        provider: pick(
            base.provider,
            overlay.provider,
            crate::EmbeddingProviderType::default(),
        ),
        huggingface: crate::HuggingFaceSettings {
            url: pick(b.url, o.url, default.url),
            api_key_env: pick(b.api_key_env, o.api_key_env, default.api_key_env),
            model: pick(b.model, o.model, default.model),
            timeout_secs: pick(b.timeout_secs, o.timeout_secs, default.timeout_secs),
            max_retries: pick(b.max_retries, o.max_retries, default.max_retries),
            wait_for_model: pick(b.wait_for_model, o.wait_for_model, default.wait_for_model),
        },
        openai: overlay.openai.or(base.openai),
    }
}

fn merge_classification(
    b: crate::ClassificationConfig,
    o: crate::ClassificationConfig,
) -> crate::ClassificationConfig {
    let default = crate::ClassificationConfig::default();
    crate::ClassificationConfig {
        url: pick(b.url, o.url, default.url),
        api_key_env: pick(b.api_key_env, o.api_key_env, default.api_key_env),
        model: pick(b.model, o.model, default.model),
        timeout_secs: pick(b.timeout_secs, o.timeout_secs, default.timeout_secs),
        max_retries: pick(b.max_retries, o.max_retries, default.max_retries),
        wait_for_model: pick(b.wait_for_model, o.wait_for_model, default.wait_for_model),
    }
}

fn merge_search(base: crate::SearchConfig, overlay: crate::SearchConfig) -> crate::SearchConfig {
    let default = crate::SearchConfig::default();
    crate::SearchConfig {
        filter_mode: pick(base.filter_mode, overlay.filter_mode, default.filter_mode),
        default_query: pick(
            base.default_query,
            overlay.default_query,
            default.default_query,
        ),
    }
}

fn merge_logging(
    base: crate::LoggingConfig,
    overlay: crate::LoggingConfig,
) -> crate::LoggingConfig {
    let default = crate::LoggingConfig::default();
    crate::LoggingConfig {
        level: pick(base.level, overlay.level, default.level),
        format: pick(base.format, overlay.format, default.format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterMode, StoreBackend};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) {
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_defaults_without_files() {
        let home = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(home.path().join(CONFIG_DIR));

        let config = loader.load(work.path(), None).unwrap();
        assert_eq!(config.store.collection, "job_collection");
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_local_overrides_global() {
        let home = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let global_dir = home.path().join(CONFIG_DIR);

        write_config(
            &global_dir,
            r#"
            [store]
            backend = "qdrant"
            collection = "global_jobs"

            [logging]
            level = "debug"
            "#,
        );
        write_config(
            &work.path().join(CONFIG_DIR),
            r#"
            [store]
            collection = "local_jobs"
            "#,
        );

        let mut loader = ConfigLoader::with_global_dir(&global_dir);
        let config = loader.load(work.path(), None).unwrap();

        assert_eq!(config.store.collection, "local_jobs");
        // Untouched by the local file
        assert_eq!(config.store.backend, StoreBackend::Qdrant);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_overrides_applied_last() {
        let home = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        write_config(
            &work.path().join(CONFIG_DIR),
            r#"
            [search]
            filter_mode = "post-filter"
            "#,
        );

        let mut loader = ConfigLoader::with_global_dir(home.path().join(CONFIG_DIR));
        let overrides = ConfigOverrides {
            filter_mode: Some(FilterMode::Diagnostic),
            store_backend: Some(StoreBackend::Qdrant),
            ..Default::default()
        };
        let config = loader.load(work.path(), Some(&overrides)).unwrap();

        assert_eq!(config.search.filter_mode, FilterMode::Diagnostic);
        assert_eq!(config.store.backend, StoreBackend::Qdrant);
    }

    #[test]
    fn test_parse_error_names_file() {
        let home = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        write_config(&work.path().join(CONFIG_DIR), "store = [not toml");

        let mut loader = ConfigLoader::with_global_dir(home.path().join(CONFIG_DIR));
        let err = loader.load(work.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_init_local_writes_defaults_once() {
        let work = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(work.path().join("home"));

        let path = loader.init_local(work.path()).unwrap();
        assert!(path.exists());
        let parsed = loader.load_file(&path).unwrap();
        assert_eq!(parsed.classification.model, "facebook/bart-large-mnli");

        std::fs::write(&path, "[store]\ncollection = \"kept\"\n").unwrap();
        loader.init_local(work.path()).unwrap();
        let parsed = loader.load_file(&path).unwrap();
        assert_eq!(parsed.store.collection, "kept");
    }

    #[test]
    fn test_global_config_cached() {
        let home = TempDir::new().unwrap();
        let global_dir = home.path().join(CONFIG_DIR);
        write_config(&global_dir, "[store]\ncollection = \"first\"\n");

        let mut loader = ConfigLoader::with_global_dir(&global_dir);
        assert_eq!(
            loader.load_global().unwrap().unwrap().store.collection,
            "first"
        );

        write_config(&global_dir, "[store]\ncollection = \"second\"\n");
        assert_eq!(
            loader.load_global().unwrap().unwrap().store.collection,
            "first"
        );

        loader.clear_cache();
        assert_eq!(
            loader.load_global().unwrap().unwrap().store.collection,
            "second"
        );
    }
}
