//! Embedding model abstraction and HTTP adapter.
//!
//! Defines the [`EmbeddingModel`] trait and its production implementation,
//! [`HttpEmbedder`], which calls any OpenAI-compatible `/embeddings`
//! endpoint — a hosted API or a local model server such as Ollama.
//!
//! # Retry Strategy
//!
//! The adapter retries transient failures with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! The pipeline itself never retries; retry policy lives here, in the
//! collaborator adapter.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::EmbeddingConfig;

/// A text-to-vector model with a fixed output width.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Model identifier (e.g. `"all-minilm"`).
    fn model_name(&self) -> &str;

    /// Output vector width (e.g. `384`).
    fn dims(&self) -> usize;

    /// Prepare the model for use. Called once before the first embedding;
    /// calling it again is a no-op.
    async fn init(&self) -> Result<()>;

    /// Embed a single text into a fixed-width vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Production adapter for OpenAI-compatible embeddings endpoints.
pub struct HttpEmbedder {
    config: EmbeddingConfig,
    client: OnceCell<reqwest::Client>,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }

    async fn client(&self) -> Result<&reqwest::Client> {
        self.client
            .get_or_try_init(|| async {
                reqwest::Client::builder()
                    .timeout(Duration::from_secs(self.config.timeout_secs))
                    .build()
                    .context("Failed to build embeddings HTTP client")
            })
            .await
    }
}

#[async_trait]
impl EmbeddingModel for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dims(&self) -> usize {
        self.config.dims
    }

    async fn init(&self) -> Result<()> {
        self.client().await.map(|_| ())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let client = self.client().await?;

        let body = serde_json::json!({
            "model": self.config.model,
            "input": [text],
        });

        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut request = client.post(self.endpoint()).json(&body);
            if let Some(ref key) = self.config.api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        let mut vectors = parse_embeddings_response(&json)?;
                        return vectors
                            .pop()
                            .filter(|v| !v.is_empty())
                            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"));
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Embeddings API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Embeddings API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "Embeddings connection error (is the model server running at {}?): {}",
                        self.config.base_url,
                        e
                    ));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Embedding failed after retries")))
    }
}

/// Parse an OpenAI-style embeddings response: `data[].embedding` arrays,
/// returned in input order.
fn parse_embeddings_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing data array"))?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid embeddings response: missing embedding"))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        embeddings.push(vec);
    }

    Ok(embeddings)
}
