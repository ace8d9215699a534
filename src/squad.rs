//! SQuAD dataset loader.
//!
//! Fetches the SQuAD JSON document (from a URL or a local file), flattens
//! the nested `data[].paragraphs[].qas[]` arrays into one [`SquadRecord`]
//! per question, and optionally deduplicates rows by context so each
//! passage is embedded once.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;

use crate::models::SquadRecord;
use crate::source::MemorySource;

#[derive(Debug, Deserialize)]
struct SquadFile {
    data: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    context: String,
    qas: Vec<Qa>,
}

#[derive(Debug, Deserialize)]
struct Qa {
    id: String,
    question: String,
    #[serde(default)]
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
struct Answer {
    text: String,
}

/// Load the dataset from a URL or local path into a [`MemorySource`].
pub async fn load_squad(location: &str, dedup_by_context: bool) -> Result<MemorySource> {
    let raw = fetch(location).await?;
    let file: SquadFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse SQuAD JSON from {}", location))?;

    let mut records = flatten(file);
    if dedup_by_context {
        records = dedup(records);
    }
    Ok(MemorySource::new(records))
}

async fn fetch(location: &str) -> Result<String> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let response = reqwest::get(location)
            .await
            .with_context(|| format!("Failed to fetch dataset from {}", location))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Dataset fetch failed with HTTP {} for {}", status, location);
        }
        Ok(response.text().await?)
    } else {
        tokio::fs::read_to_string(location)
            .await
            .with_context(|| format!("Failed to read dataset file {}", location))
    }
}

/// Flatten articles → paragraphs → questions into one record per question.
/// The first answer text is taken; questions without answers get an empty
/// answer rather than being dropped.
fn flatten(file: SquadFile) -> Vec<SquadRecord> {
    let mut records = Vec::new();
    for article in file.data {
        for paragraph in article.paragraphs {
            for qa in paragraph.qas {
                let answer = qa
                    .answers
                    .into_iter()
                    .next()
                    .map(|a| a.text)
                    .unwrap_or_default();
                records.push(SquadRecord {
                    id: qa.id,
                    context: paragraph.context.clone(),
                    question: qa.question,
                    answer,
                });
            }
        }
    }
    records
}

/// Keep the first record for each distinct context, preserving order.
fn dedup(records: Vec<SquadRecord>) -> Vec<SquadRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.context.clone()))
        .collect()
}
