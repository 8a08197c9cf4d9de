use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LiftlogConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub ranking: RankingWeights,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// Owner id used by the CLI when `--owner` is not given.
    pub default_owner: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"local"` (ONNX all-MiniLM-L6-v2) or `"hash"` (deterministic, offline).
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Candidates below this cosine similarity are discarded before ranking.
    pub similarity_threshold: f64,
    /// Raw candidates fetched from the vector index per query.
    pub candidate_k: usize,
    /// Results returned to the caller after ranking.
    pub max_results: usize,
    pub search_timeout_ms: u64,
}

/// Scoring constants for the result ranker.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RankingWeights {
    pub similarity: f64,
    /// Maximum recency bonus, awarded to activities performed today.
    pub recency: f64,
    /// Age in days at which the recency bonus reaches zero.
    pub recency_horizon_days: u32,
    pub exact_match: f64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_liftlog_dir()
            .join("activities.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            default_owner: "default".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_liftlog_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            candidate_k: 20,
            max_results: 10,
            search_timeout_ms: 5000,
        }
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            similarity: 1.0,
            recency: 0.1,
            recency_horizon_days: 30,
            exact_match: 0.15,
        }
    }
}

/// Returns `~/.liftlog/`, or `./.liftlog` when no home directory is known.
pub fn default_liftlog_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".liftlog")
}

/// Returns the default config file path: `~/.liftlog/config.toml`
pub fn default_config_path() -> PathBuf {
    default_liftlog_dir().join("config.toml")
}

impl LiftlogConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LiftlogConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (LIFTLOG_DB, LIFTLOG_OWNER, LIFTLOG_LOG_LEVEL, LIFTLOG_EMBEDDER).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LIFTLOG_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("LIFTLOG_OWNER") {
            self.storage.default_owner = val;
        }
        if let Ok(val) = std::env::var("LIFTLOG_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("LIFTLOG_EMBEDDER") {
            self.embedding.provider = val;
        }
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.retrieval.similarity_threshold;
        anyhow::ensure!(
            (0.0..=1.0).contains(&threshold),
            "retrieval.similarity_threshold must be within [0, 1], got {threshold}"
        );
        anyhow::ensure!(
            self.retrieval.candidate_k > 0,
            "retrieval.candidate_k must be positive"
        );
        anyhow::ensure!(
            self.retrieval.max_results > 0,
            "retrieval.max_results must be positive"
        );
        anyhow::ensure!(
            self.ranking.recency_horizon_days > 0,
            "ranking.recency_horizon_days must be positive"
        );
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
