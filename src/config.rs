use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Tunables for the similarity search and consolidation engine.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a match to be considered.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    /// Maximum number of candidates returned by a similarity query.
    #[serde(default = "default_match_count")]
    pub match_count: i64,
    /// How many top-k matches must share a topic before the full topic
    /// corpus is retrieved instead of the raw matches.
    #[serde(default = "default_vote_threshold")]
    pub vote_threshold: usize,
    /// Cap on entries concatenated into one context blob.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            match_count: default_match_count(),
            vote_threshold: default_vote_threshold(),
            max_chunks: default_max_chunks(),
        }
    }
}

fn default_match_threshold() -> f64 {
    0.5
}
fn default_match_count() -> i64 {
    10
}
fn default_vote_threshold() -> usize {
    3
}
fn default_max_chunks() -> usize {
    25
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: default_dims(),
            url: None,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_dims() -> usize {
    768
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate retrieval
    if !(0.0..=1.0).contains(&config.retrieval.match_threshold) {
        anyhow::bail!("retrieval.match_threshold must be in [0.0, 1.0]");
    }
    if config.retrieval.match_count < 1 {
        anyhow::bail!("retrieval.match_count must be >= 1");
    }
    if config.retrieval.vote_threshold < 1 {
        anyhow::bail!("retrieval.vote_threshold must be >= 1");
    }
    if config.retrieval.max_chunks < 1 {
        anyhow::bail!("retrieval.max_chunks must be >= 1");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims == 0 {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "gemini" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, gemini, or ollama.",
            other
        ),
    }

    Ok(config)
}
