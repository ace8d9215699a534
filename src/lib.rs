//! # Passage Index
//!
//! A batched embedding-and-upsert pipeline for QA datasets.
//!
//! Passage Index loads a SQuAD-style dataset, turns each row into a
//! document, embeds documents in concurrent sub-batches, and commits
//! the resulting vectors to a Pinecone index in bounded upsert chunks.
//! A similarity-search command queries the same index.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────┐
//! │  SQuAD   │──▶│   Pipeline     │──▶│  Pinecone  │
//! │  JSON    │   │ Chunk+Embed   │   │   index   │
//! └──────────┘   └───────────────┘   └─────┬─────┘
//!                                          │
//!                                          ▼
//!                                    ┌──────────┐
//!                                    │   CLI    │
//!                                    │  (pidx)  │
//!                                    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pidx index                     # ingest the dataset
//! pidx index --limit 1000        # ingest a prefix
//! pidx query "when was the city founded?"
//! pidx status                    # config and index stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment configuration |
//! | [`models`] | Core data types |
//! | [`source`] | Tabular source abstraction |
//! | [`squad`] | SQuAD dataset loader |
//! | [`chunks`] | Lazy chunk production |
//! | [`embedding`] | Embedding model abstraction |
//! | [`batch`] | Concurrent sub-batch embedding |
//! | [`index`] | Vector index abstraction |
//! | [`sink`] | Chunked upsert |
//! | [`progress`] | Progress reporting |
//! | [`pipeline`] | The ingest pipeline driver |
//! | [`query`] | Similarity search |
//! | [`status`] | Config and index statistics |

pub mod batch;
pub mod chunks;
pub mod config;
pub mod embedding;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod sink;
pub mod source;
pub mod squad;
pub mod status;
