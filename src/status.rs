//! The `status` command: configuration summary and index statistics.

use anyhow::Result;

use crate::config::Config;
use crate::index::VectorIndex;
use crate::progress::format_number;

/// Print the effective configuration (secrets redacted) and, when
/// the index is reachable, its statistics.
pub async fn run(config: &Config, index: &dyn VectorIndex) -> Result<()> {
    println!("Index:            {}", config.pinecone.index);
    println!("Environment:      {}", config.pinecone.environment);
    println!("Namespace:        {}", config.pinecone.namespace);
    println!("Embedding model:  {}", config.embedding.model);
    println!("Embedding dims:   {}", config.embedding.dims);
    println!("Chunk size:       {}", config.pipeline.chunk_size);
    println!("Batch size:       {}", config.pipeline.batch_size);
    println!("Upsert chunk:     {}", config.pipeline.upsert_chunk_size);
    println!();

    match index.stats().await {
        Ok(stats) => {
            println!("Index dimension:  {}", stats.dimension);
            println!(
                "Total vectors:    {}",
                format_number(stats.total_vector_count)
            );
            if stats.dimension != config.embedding.dims {
                println!();
                println!(
                    "Warning: index dimension {} does not match EMBEDDING_DIMS {}",
                    stats.dimension, config.embedding.dims
                );
            }
        }
        Err(e) => {
            println!("Index unreachable: {}", e);
        }
    }

    Ok(())
}
