//! # Passage Index CLI (`pidx`)
//!
//! The `pidx` binary ingests a SQuAD-style QA dataset into a Pinecone
//! vector index and queries it by similarity.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pidx index` | Load the dataset, embed it, and upsert into the index |
//! | `pidx query "<text>"` | Similarity search against the index |
//! | `pidx status` | Print the effective configuration and index statistics |
//!
//! ## Examples
//!
//! ```bash
//! # Ingest the full dataset
//! pidx index
//!
//! # Ingest the first thousand rows from a local file
//! pidx index --data ./squad.json --limit 1000
//!
//! # Chunk and embed without touching the index
//! pidx index --dry-run --progress json
//!
//! # Search
//! pidx query "when was the university founded?" --top-k 5
//! ```
//!
//! Configuration comes from environment variables (a `.env` file is
//! loaded if present). `PINECONE_API_KEY`, `PINECONE_ENVIRONMENT`,
//! and `PINECONE_INDEX` are required; everything else has a default.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use passage_index::config::Config;
use passage_index::embedding::HttpEmbedder;
use passage_index::index::PineconeIndex;
use passage_index::pipeline::{self, PipelineOptions};
use passage_index::progress::{format_number, ProgressMode};
use passage_index::query;
use passage_index::squad;
use passage_index::status;

/// Passage Index — batched embedding and upsert for QA datasets.
#[derive(Parser)]
#[command(
    name = "pidx",
    about = "Passage Index — batched embedding and upsert for QA datasets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Load the dataset, embed it, and upsert into the index.
    ///
    /// Creates the index if it does not exist. Upserts overwrite by
    /// vector id, so re-running this command converges instead of
    /// duplicating.
    Index {
        /// Dataset location: an http(s) URL or a local file path.
        /// Defaults to `SQUAD_URL`.
        #[arg(long)]
        data: Option<String>,

        /// Only process the first N rows.
        #[arg(long)]
        limit: Option<usize>,

        /// Rows per chunk pulled from the source.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Documents embedded concurrently per sub-batch.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Target namespace within the index.
        #[arg(long)]
        namespace: Option<String>,

        /// Chunk and embed, but never touch the index.
        #[arg(long)]
        dry_run: bool,

        /// Progress output: `auto`, `human`, `json`, or `off`.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Similarity search against the index.
    Query {
        /// The query text.
        text: String,

        /// Number of matches to return.
        #[arg(long, default_value_t = 10)]
        top_k: usize,

        /// Namespace to search within.
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Print the effective configuration and index statistics.
    Status,
}

fn parse_progress(mode: &str) -> Result<ProgressMode> {
    match mode {
        "auto" => Ok(ProgressMode::default_for_tty()),
        "human" => Ok(ProgressMode::Human),
        "json" => Ok(ProgressMode::Json),
        "off" => Ok(ProgressMode::Off),
        other => bail!("Unknown progress mode '{}' (expected auto, human, json, or off)", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Index {
            data,
            limit,
            chunk_size,
            batch_size,
            namespace,
            dry_run,
            progress,
        } => {
            // Flag overrides bypass Config::validate, so check them here,
            // before the dataset is fetched.
            if chunk_size == Some(0) {
                bail!("--chunk-size must be >= 1");
            }
            if batch_size == Some(0) {
                bail!("--batch-size must be >= 1");
            }

            let progress = parse_progress(&progress)?.reporter();
            let location = data.as_deref().unwrap_or(&config.squad_url);
            let namespace = namespace.as_deref().unwrap_or(&config.pinecone.namespace);

            eprintln!("Loading dataset from {}...", location);
            let mut source =
                squad::load_squad(location, config.pipeline.dedup_by_context).await?;
            if let Some(limit) = limit {
                source.truncate(limit);
            }

            let model = HttpEmbedder::new(config.embedding.clone());
            let index = PineconeIndex::new(config.pinecone.clone())?;
            let options = PipelineOptions {
                chunk_size: chunk_size.unwrap_or(config.pipeline.chunk_size),
                batch_size: batch_size.unwrap_or(config.pipeline.batch_size),
                upsert_chunk_size: config.pipeline.upsert_chunk_size,
                use_dataset_ids: config.pipeline.use_dataset_ids,
                dry_run,
            };

            let report = pipeline::run(
                &source,
                &model,
                &index,
                &config.pinecone.index,
                namespace,
                &options,
                progress.as_ref(),
            )
            .await?;

            if dry_run {
                println!(
                    "Dry run: embedded {} vectors from {} rows in {} chunks (nothing upserted).",
                    format_number(report.vectors_committed),
                    format_number(report.rows as u64),
                    report.chunks
                );
            } else {
                println!(
                    "Inserted {} vectors into index {}",
                    format_number(report.vectors_committed),
                    config.pinecone.index
                );
            }
        }
        Commands::Query {
            text,
            top_k,
            namespace,
        } => {
            let namespace = namespace.as_deref().unwrap_or(&config.pinecone.namespace);
            let model = HttpEmbedder::new(config.embedding.clone());
            let index = PineconeIndex::new(config.pinecone.clone())?;
            let matches = query::search(&model, &index, namespace, &text, top_k).await?;
            query::print_matches(&matches);
        }
        Commands::Status => {
            let index = PineconeIndex::new(config.pinecone.clone())?;
            status::run(&config, &index).await?;
        }
    }

    Ok(())
}
