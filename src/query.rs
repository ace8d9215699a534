//! Similarity search against the index.

use anyhow::{Context, Result};

use crate::embedding::EmbeddingModel;
use crate::index::VectorIndex;
use crate::models::QueryMatch;

/// Embed `text` and return the `top_k` nearest vectors from `namespace`.
pub async fn search(
    model: &dyn EmbeddingModel,
    index: &dyn VectorIndex,
    namespace: &str,
    text: &str,
    top_k: usize,
) -> Result<Vec<QueryMatch>> {
    model.init().await.context("Failed to initialize embedding model")?;
    let vector = model
        .embed(text)
        .await
        .context("Failed to embed query text")?;
    index
        .query(namespace, &vector, top_k)
        .await
        .context("Query failed")
}

/// Render matches for the terminal, best first.
pub fn print_matches(matches: &[QueryMatch]) {
    if matches.is_empty() {
        println!("No matches found.");
        return;
    }

    for (rank, m) in matches.iter().enumerate() {
        println!("{}. [{:.4}] {}", rank + 1, m.score, m.id);
        if let Some(question) = m.metadata.get("question").and_then(|v| v.as_str()) {
            println!("   Q: {}", question);
        }
        if let Some(answer) = m.metadata.get("answer").and_then(|v| v.as_str()) {
            println!("   A: {}", answer);
        }
        let context = m
            .metadata
            .get("context")
            .or_else(|| m.metadata.get("text"))
            .and_then(|v| v.as_str());
        if let Some(context) = context {
            println!("   {}", excerpt(context, 200));
        }
        println!();
    }
}

/// First `max` characters on a char boundary, with an ellipsis when cut.
fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}
