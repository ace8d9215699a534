//! Chunked upsert into the vector index.

use anyhow::{Context, Result};

use crate::index::VectorIndex;
use crate::models::EmbeddingVector;
use crate::progress::ProgressReporter;

/// Upsert `vectors` into `namespace` in sub-chunks of at most
/// `chunk_size`, advancing `progress` after each committed sub-chunk.
///
/// Sub-chunks are committed strictly in order. On failure, sub-chunks
/// already committed stay in the index; the failed one is not retried
/// here. Because upserts overwrite by id, re-running the pipeline
/// converges rather than duplicating.
pub async fn chunked_upsert(
    index: &dyn VectorIndex,
    namespace: &str,
    vectors: Vec<EmbeddingVector>,
    chunk_size: usize,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    assert!(chunk_size >= 1, "upsert chunk size must be >= 1");

    for chunk in vectors.chunks(chunk_size) {
        index
            .upsert(namespace, chunk)
            .await
            .with_context(|| format!("Failed to upsert {} vectors", chunk.len()))?;
        progress.advance(chunk.len() as u64);
    }
    Ok(())
}
