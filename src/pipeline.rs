//! The ingest pipeline: chunk, embed, upsert.
//!
//! Walks the source in chunks, embeds each chunk in concurrent
//! sub-batches, and commits embeddings to the index in bounded
//! upsert sub-chunks. The three stages are strictly ordered per
//! chunk: the next sub-batch is not embedded until the previous
//! sub-batch's vectors are committed, so at most one sub-batch of
//! vectors is in flight at any time.
//!
//! Failures abort the run. Vectors committed before the failure
//! stay in the index; because upserts overwrite by id, re-running
//! converges instead of duplicating.

use anyhow::{Context, Result};

use crate::batch::embed_batch;
use crate::chunks::ChunkProducer;
use crate::embedding::EmbeddingModel;
use crate::index::VectorIndex;
use crate::progress::ProgressReporter;
use crate::sink::chunked_upsert;
use crate::source::TabularSource;

/// Knobs for a single pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Rows pulled from the source per chunk.
    pub chunk_size: usize,
    /// Documents embedded concurrently per sub-batch.
    pub batch_size: usize,
    /// Vectors per upsert request.
    pub upsert_chunk_size: usize,
    /// Reuse dataset row ids as vector ids. When false, every run
    /// generates fresh ids and re-runs will not overwrite.
    pub use_dataset_ids: bool,
    /// Chunk and embed, but never touch the index.
    pub dry_run: bool,
}

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub rows: usize,
    pub chunks: usize,
    pub vectors_committed: u64,
}

/// Run the full pipeline over `source`, committing into `namespace`
/// of the named index.
pub async fn run(
    source: &dyn TabularSource,
    model: &dyn EmbeddingModel,
    index: &dyn VectorIndex,
    index_name: &str,
    namespace: &str,
    options: &PipelineOptions,
    progress: &dyn ProgressReporter,
) -> Result<PipelineReport> {
    let rows = source.row_count();
    progress.start(rows as u64);
    let chunks = match drive(source, model, index, index_name, namespace, options, progress).await
    {
        Ok(chunks) => {
            progress.stop();
            chunks
        }
        Err(e) => {
            progress.abort();
            return Err(e);
        }
    };

    Ok(PipelineReport {
        rows,
        chunks,
        vectors_committed: progress.committed(),
    })
}

async fn drive(
    source: &dyn TabularSource,
    model: &dyn EmbeddingModel,
    index: &dyn VectorIndex,
    index_name: &str,
    namespace: &str,
    options: &PipelineOptions,
    progress: &dyn ProgressReporter,
) -> Result<usize> {
    if !options.dry_run {
        index
            .ensure_exists(index_name, model.dims())
            .await
            .with_context(|| format!("Failed to ensure index '{}' exists", index_name))?;
    }

    model
        .init()
        .await
        .with_context(|| format!("Failed to initialize embedding model '{}'", model.model_name()))?;

    let mut producer = ChunkProducer::new(source, options.chunk_size);
    let mut chunks = 0;

    while let Some(documents) = producer.next_chunk().await? {
        chunks += 1;
        embed_batch(
            model,
            &documents,
            options.batch_size,
            options.use_dataset_ids,
            |vectors| async move {
                if options.dry_run {
                    progress.advance(vectors.len() as u64);
                    return Ok(());
                }
                chunked_upsert(index, namespace, vectors, options.upsert_chunk_size, progress)
                    .await
            },
        )
        .await?;
    }

    Ok(chunks)
}
