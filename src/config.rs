//! TOML configuration parsing and validation.
//!
//! Every section has defaults, so an empty file is a valid configuration
//! (with no corpus locations and the local embedding provider).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Directories scanned in the given order.
    #[serde(default)]
    pub locations: Vec<PathBuf>,
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
    /// File-name patterns selecting chunk-bearing files within a location.
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    /// Record fields tried in order; the first non-empty string wins.
    #[serde(default = "default_text_fields")]
    pub text_fields: Vec<String>,
    /// Treat symlinks to files as chunk files.
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            max_chunks: default_max_chunks(),
            include_globs: default_include_globs(),
            text_fields: default_text_fields(),
            follow_symlinks: default_follow_symlinks(),
        }
    }
}

fn default_max_chunks() -> usize {
    600
}
fn default_include_globs() -> Vec<String> {
    vec!["*.jsonl".to_string()]
}
fn default_text_fields() -> Vec<String> {
    vec!["text".to_string(), "body".to_string()]
}
fn default_follow_symlinks() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_total_chars")]
    pub max_total_chars: usize,
    /// Joins selected chunks when printing a bundle as prompt context.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            max_total_chars: default_max_total_chars(),
            separator: default_separator(),
        }
    }
}

fn default_top_n() -> usize {
    6
}
fn default_max_total_chars() -> usize {
    1800
}
fn default_separator() -> String {
    "\n\n".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_model() -> String {
    "all-minilm-l6-v2".to_string()
}
fn default_batch_size() -> usize {
    64
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
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate corpus
    if config.corpus.max_chunks == 0 {
        bail!("corpus.max_chunks must be > 0");
    }
    if config.corpus.include_globs.is_empty() {
        bail!("corpus.include_globs must not be empty");
    }
    if config.corpus.text_fields.is_empty() {
        bail!("corpus.text_fields must not be empty");
    }

    // Validate retrieval
    if config.retrieval.top_n == 0 {
        bail!("retrieval.top_n must be > 0");
    }
    if config.retrieval.max_total_chars == 0 {
        bail!("retrieval.max_total_chars must be > 0");
    }

    // Validate embedding
    if config.embedding.model.trim().is_empty() {
        bail!("embedding.model must not be empty");
    }
    if config.embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0 when set");
    }
    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert!(cfg.corpus.locations.is_empty());
        assert_eq!(cfg.corpus.max_chunks, 600);
        assert_eq!(cfg.corpus.include_globs, vec!["*.jsonl"]);
        assert_eq!(cfg.corpus.text_fields, vec!["text", "body"]);
        assert!(cfg.corpus.follow_symlinks);
        assert_eq!(cfg.retrieval.top_n, 6);
        assert_eq!(cfg.retrieval.max_total_chars, 1800);
        assert_eq!(cfg.retrieval.separator, "\n\n");
        assert_eq!(cfg.embedding.provider, "local");
        assert_eq!(cfg.embedding.model, "all-minilm-l6-v2");
        assert!(cfg.embedding.is_enabled());
    }

    #[test]
    fn test_full_config() {
        let cfg = parse_config(
            r#"
[corpus]
locations = ["data/dsm5_chunks", "data/dataset_chunks"]
max_chunks = 300

[retrieval]
top_n = 4
max_total_chars = 4000

[embedding]
provider = "ollama"
model = "nomic-embed-text"
url = "http://localhost:11434"
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.corpus.locations,
            vec![
                PathBuf::from("data/dsm5_chunks"),
                PathBuf::from("data/dataset_chunks")
            ]
        );
        assert_eq!(cfg.corpus.max_chunks, 300);
        assert_eq!(cfg.retrieval.top_n, 4);
        assert_eq!(cfg.retrieval.max_total_chars, 4000);
        assert_eq!(cfg.embedding.provider, "ollama");
        assert_eq!(cfg.embedding.url.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn test_rejects_zero_knobs() {
        for bad in [
            "[corpus]\nmax_chunks = 0",
            "[retrieval]\ntop_n = 0",
            "[retrieval]\nmax_total_chars = 0",
            "[embedding]\nbatch_size = 0",
            "[embedding]\ndims = 0",
        ] {
            assert!(parse_config(bad).is_err(), "should reject: {}", bad);
        }
    }

    #[test]
    fn test_rejects_empty_model() {
        let err = parse_config("[embedding]\nmodel = \"  \"").unwrap_err();
        assert!(err.to_string().contains("embedding.model"));
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let err = parse_config("[embedding]\nprovider = \"cohere\"").unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_rejects_negative_count() {
        assert!(parse_config("[corpus]\nmax_chunks = -1").is_err());
    }
}
