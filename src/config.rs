//! Environment-driven configuration.
//!
//! All settings come from environment variables (a `.env` file is honored
//! via `dotenvy` in `main`). The three Pinecone variables are required and
//! validated before any network I/O; everything else has a default.

use anyhow::{bail, Context, Result};
use std::str::FromStr;

/// Default SQuAD v1.1 training set, the dataset this pipeline was built for.
pub const DEFAULT_SQUAD_URL: &str =
    "https://rajpurkar.github.io/SQuAD-explorer/dataset/train-v1.1.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub pinecone: PineconeConfig,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
    /// URL or local path of the dataset JSON.
    pub squad_url: String,
}

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub environment: String,
    pub index: String,
    pub namespace: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible embeddings endpoint.
    pub base_url: String,
    /// Optional bearer token; local servers usually need none.
    pub api_key: Option<String>,
    pub model: String,
    pub dims: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Rows per dataset chunk.
    pub chunk_size: usize,
    /// Documents embedded concurrently in one sub-batch.
    pub batch_size: usize,
    /// Vectors per upsert request.
    pub upsert_chunk_size: usize,
    /// Take vector ids from dataset metadata; `false` regenerates all ids.
    pub use_dataset_ids: bool,
    /// Drop duplicate contexts before embedding, keeping first occurrence.
    pub dedup_by_context: bool,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Fails fast if a required variable is missing or any value is
    /// malformed, before any network call is made.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            pinecone: PineconeConfig {
                api_key: required(&lookup, "PINECONE_API_KEY")?,
                environment: required(&lookup, "PINECONE_ENVIRONMENT")?,
                index: required(&lookup, "PINECONE_INDEX")?,
                namespace: lookup("PINECONE_NAMESPACE").unwrap_or_else(|| "default".to_string()),
            },
            embedding: EmbeddingConfig {
                base_url: lookup("EMBEDDING_BASE_URL")
                    .unwrap_or_else(|| "http://localhost:11434/v1".to_string()),
                api_key: lookup("EMBEDDING_API_KEY"),
                model: lookup("EMBEDDING_MODEL").unwrap_or_else(|| "all-minilm".to_string()),
                dims: parsed(&lookup, "EMBEDDING_DIMS", 384)?,
                timeout_secs: parsed(&lookup, "EMBEDDING_TIMEOUT_SECS", 30)?,
                max_retries: parsed(&lookup, "EMBEDDING_MAX_RETRIES", 5)?,
            },
            pipeline: PipelineConfig {
                chunk_size: parsed(&lookup, "PIDX_CHUNK_SIZE", 256)?,
                batch_size: parsed(&lookup, "PIDX_BATCH_SIZE", 64)?,
                upsert_chunk_size: parsed(&lookup, "PIDX_UPSERT_CHUNK_SIZE", 100)?,
                use_dataset_ids: parsed_bool(&lookup, "PIDX_USE_DATASET_IDS", true)?,
                dedup_by_context: parsed_bool(&lookup, "PIDX_DEDUP_BY_CONTEXT", true)?,
            },
            squad_url: lookup("SQUAD_URL").unwrap_or_else(|| DEFAULT_SQUAD_URL.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.chunk_size == 0 {
            bail!("PIDX_CHUNK_SIZE must be >= 1");
        }
        if self.pipeline.batch_size == 0 {
            bail!("PIDX_BATCH_SIZE must be >= 1");
        }
        if self.pipeline.upsert_chunk_size == 0 {
            bail!("PIDX_UPSERT_CHUNK_SIZE must be >= 1");
        }
        if self.embedding.dims == 0 {
            bail!("EMBEDDING_DIMS must be >= 1");
        }
        if self.pinecone.index.trim().is_empty() {
            bail!("PINECONE_INDEX must not be empty");
        }
        Ok(())
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{} environment variable not set", key),
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: '{}'", key, value)),
        None => Ok(default),
    }
}

fn parsed_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("true") | Some("1") | Some("yes") => Ok(true),
        Some("false") | Some("0") | Some("no") => Ok(false),
        Some(other) => bail!("Invalid value for {}: '{}' (expected true/false)", key, other),
    }
}
