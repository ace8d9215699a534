//! Lazy chunk production over a tabular source.
//!
//! A [`ChunkProducer`] slices the source into fixed-size row groups on
//! demand and maps each group to documents. Concatenating all chunks
//! reproduces the source order exactly; the final chunk may be shorter.
//! A producer is single-use — create a fresh one per run.

use anyhow::Result;

use crate::models::{Document, SquadRecord};
use crate::source::TabularSource;

pub struct ChunkProducer<'a> {
    source: &'a dyn TabularSource,
    chunk_size: usize,
    offset: usize,
    total: usize,
    done: bool,
}

impl<'a> ChunkProducer<'a> {
    /// `chunk_size` must be >= 1 (validated at config load).
    pub fn new(source: &'a dyn TabularSource, chunk_size: usize) -> Self {
        assert!(chunk_size >= 1, "chunk_size must be >= 1");
        Self {
            source,
            chunk_size,
            offset: 0,
            total: source.row_count(),
            done: false,
        }
    }

    /// Number of chunks this producer will yield.
    pub fn expected_chunks(&self) -> usize {
        self.total.div_ceil(self.chunk_size)
    }

    /// Materialize the next chunk of documents, or `None` when exhausted.
    ///
    /// A source read failure terminates the sequence: the error is returned
    /// and every later call yields `None`.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<Document>>> {
        if self.done || self.offset >= self.total {
            self.done = true;
            return Ok(None);
        }

        let records = match self.source.slice(self.offset, self.chunk_size).await {
            Ok(records) => records,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        if records.is_empty() {
            self.done = true;
            return Ok(None);
        }

        self.offset += records.len();
        Ok(Some(
            records.into_iter().map(SquadRecord::into_document).collect(),
        ))
    }
}
