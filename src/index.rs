//! Vector index abstraction and Pinecone adapter.
//!
//! Defines the [`VectorIndex`] trait and its production implementation,
//! [`PineconeIndex`], which talks to Pinecone's legacy environment-based
//! REST API: the control plane (`controller.{env}.pinecone.io`) for index
//! creation, and the per-index data plane for upsert, query, and stats.
//!
//! Upserts are insert-or-overwrite keyed by vector id, so re-running the
//! pipeline against the same ids never duplicates vectors. Transient
//! failures (429, 5xx, network) are retried here with the same backoff
//! schedule as the embeddings adapter; the pipeline core never retries.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::PineconeConfig;
use crate::models::{EmbeddingVector, IndexStats, QueryMatch};

/// A remote vector index partitioned into namespaces.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index if it does not exist, with the given vector width.
    /// An index that already exists is success, not an error.
    async fn ensure_exists(&self, name: &str, dimension: usize) -> Result<()>;

    /// Insert-or-overwrite vectors by id into a namespace.
    async fn upsert(&self, namespace: &str, vectors: &[EmbeddingVector]) -> Result<()>;

    /// Return the `top_k` most similar vectors to `vector`, with metadata.
    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize)
        -> Result<Vec<QueryMatch>>;

    /// Index-wide statistics.
    async fn stats(&self) -> Result<IndexStats>;
}

/// Production adapter for the Pinecone REST API.
pub struct PineconeIndex {
    config: PineconeConfig,
    client: reqwest::Client,
    /// Project name resolved from the control plane, cached per process.
    project: OnceCell<String>,
    max_retries: u32,
}

impl PineconeIndex {
    pub fn new(config: PineconeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build Pinecone HTTP client")?;
        Ok(Self {
            config,
            client,
            project: OnceCell::new(),
            max_retries: 5,
        })
    }

    fn controller_url(&self, path: &str) -> String {
        format!(
            "https://controller.{}.pinecone.io{}",
            self.config.environment, path
        )
    }

    /// Data-plane host for this index, e.g.
    /// `https://squad-abc123.svc.us-east1-gcp.pinecone.io`.
    async fn index_host(&self) -> Result<String> {
        let project = self
            .project
            .get_or_try_init(|| async {
                let json = self
                    .request(reqwest::Method::GET, &self.controller_url("/actions/whoami"), None)
                    .await?;
                json.get("project_name")
                    .and_then(|p| p.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| anyhow::anyhow!("Pinecone whoami response missing project_name"))
            })
            .await?;
        Ok(format!(
            "https://{}-{}.svc.{}.pinecone.io",
            self.config.index, project, self.config.environment
        ))
    }

    /// Issue a request with retry on 429/5xx/network errors.
    async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut request = self
                .client
                .request(method.clone(), url)
                .header("Api-Key", &self.config.api_key);
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        // Some endpoints return an empty body on success.
                        let text = response.text().await.unwrap_or_default();
                        return if text.trim().is_empty() {
                            Ok(serde_json::Value::Null)
                        } else {
                            serde_json::from_str(&text)
                                .with_context(|| format!("Invalid JSON from {}", url))
                        };
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Pinecone API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Pinecone API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!("Pinecone connection error: {}", e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Pinecone request failed after retries")))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn ensure_exists(&self, name: &str, dimension: usize) -> Result<()> {
        let body = serde_json::json!({
            "name": name,
            "dimension": dimension,
            "metric": "cosine",
        });

        // No retry wrapper here: a 409 must be inspected, not retried.
        let response = self
            .client
            .post(self.controller_url("/databases"))
            .header("Api-Key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("Pinecone connection error during index creation")?;

        let status = response.status();
        if creation_satisfied(status) {
            return Ok(());
        }
        let body_text = response.text().await.unwrap_or_default();
        bail!("Failed to create index '{}': HTTP {}: {}", name, status, body_text)
    }

    async fn upsert(&self, namespace: &str, vectors: &[EmbeddingVector]) -> Result<()> {
        let host = self.index_host().await?;
        let body = serde_json::json!({
            "vectors": vectors,
            "namespace": namespace,
        });
        let json = self
            .request(reqwest::Method::POST, &format!("{}/vectors/upsert", host), Some(&body))
            .await?;

        let upserted = json
            .get("upsertedCount")
            .and_then(|c| c.as_u64())
            .unwrap_or(vectors.len() as u64);
        if upserted != vectors.len() as u64 {
            bail!(
                "Pinecone upserted {} of {} vectors",
                upserted,
                vectors.len()
            );
        }
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>> {
        let host = self.index_host().await?;
        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "namespace": namespace,
            "includeMetadata": true,
        });
        let json = self
            .request(reqwest::Method::POST, &format!("{}/query", host), Some(&body))
            .await?;
        parse_query_response(&json)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let host = self.index_host().await?;
        let json = self
            .request(
                reqwest::Method::POST,
                &format!("{}/describe_index_stats", host),
                Some(&serde_json::json!({})),
            )
            .await?;
        parse_stats_response(&json)
    }
}

/// Whether a create-index response leaves the index in place. 409 means
/// the index already exists, which is success for `ensure_exists`.
fn creation_satisfied(status: reqwest::StatusCode) -> bool {
    status.is_success() || status.as_u16() == 409
}

fn parse_query_response(json: &serde_json::Value) -> Result<Vec<QueryMatch>> {
    let matches = json
        .get("matches")
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
    serde_json::from_value(matches).context("Invalid Pinecone query response")
}

fn parse_stats_response(json: &serde_json::Value) -> Result<IndexStats> {
    let dimension = json
        .get("dimension")
        .and_then(|d| d.as_u64())
        .ok_or_else(|| anyhow::anyhow!("Pinecone stats response missing dimension"))?;
    let total = json
        .get("totalVectorCount")
        .and_then(|c| c.as_u64())
        .unwrap_or(0);
    Ok(IndexStats {
        dimension: dimension as usize,
        total_vector_count: total,
    })
}
