//! Tabular dataset source abstraction.
//!
//! The pipeline reads rows through [`TabularSource`] so that the dataset
//! backend stays swappable: production uses [`MemorySource`] filled by the
//! SQuAD loader, tests use fakes with failure injection.

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::SquadRecord;

/// An ordered, random-access table of dataset rows.
#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Total number of rows.
    fn row_count(&self) -> usize;

    /// Return up to `len` rows starting at `offset`, in table order.
    ///
    /// A slice that starts past the end is an error; a slice that runs past
    /// the end is truncated.
    async fn slice(&self, offset: usize, len: usize) -> Result<Vec<SquadRecord>>;
}

/// In-memory source over already-loaded records.
#[derive(Debug, Clone)]
pub struct MemorySource {
    records: Vec<SquadRecord>,
}

impl MemorySource {
    pub fn new(records: Vec<SquadRecord>) -> Self {
        Self { records }
    }

    /// Keep only the first `limit` rows.
    pub fn truncate(&mut self, limit: usize) {
        self.records.truncate(limit);
    }
}

#[async_trait]
impl TabularSource for MemorySource {
    fn row_count(&self) -> usize {
        self.records.len()
    }

    async fn slice(&self, offset: usize, len: usize) -> Result<Vec<SquadRecord>> {
        if offset > self.records.len() {
            bail!(
                "Slice offset {} out of bounds for {} rows",
                offset,
                self.records.len()
            );
        }
        let end = (offset + len).min(self.records.len());
        Ok(self.records[offset..end].to_vec())
    }
}
