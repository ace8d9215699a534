//! Core data models used throughout passage-index.
//!
//! These types represent the dataset rows, documents, and vectors that flow
//! through the embedding and upsert pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scalar metadata attached to documents and vectors.
pub type Metadata = Map<String, Value>;

/// One flattened row of the question-answering dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct SquadRecord {
    pub id: String,
    pub context: String,
    pub question: String,
    pub answer: String,
}

impl SquadRecord {
    /// Convert a record into a [`Document`]: the context becomes the page
    /// content, and id/question/answer/context travel along as metadata.
    pub fn into_document(self) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("id".into(), Value::String(self.id));
        metadata.insert("question".into(), Value::String(self.question));
        metadata.insert("answer".into(), Value::String(self.answer));
        metadata.insert("context".into(), Value::String(self.context.clone()));
        Document {
            page_content: self.context,
            metadata,
        }
    }
}

/// A unit of text to embed, plus its metadata.
#[derive(Debug, Clone)]
pub struct Document {
    pub page_content: String,
    pub metadata: Metadata,
}

impl Document {
    /// The dataset id carried in metadata, if any.
    pub fn id(&self) -> Option<&str> {
        self.metadata.get("id").and_then(|v| v.as_str())
    }
}

/// An embedded document ready for upsert, keyed by a string id.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingVector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Metadata,
}

/// One ranked result returned by a vector-index query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Summary statistics reported by the vector index.
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub dimension: usize,
    pub total_vector_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_to_document_carries_metadata() {
        let record = SquadRecord {
            id: "q1".into(),
            context: "The sky is blue.".into(),
            question: "What color is the sky?".into(),
            answer: "blue".into(),
        };
        let doc = record.into_document();
        assert_eq!(doc.page_content, "The sky is blue.");
        assert_eq!(doc.id(), Some("q1"));
        assert_eq!(doc.metadata["question"], "What color is the sky?");
        assert_eq!(doc.metadata["answer"], "blue");
        assert_eq!(doc.metadata["context"], "The sky is blue.");
    }

    #[test]
    fn document_without_id() {
        let doc = Document {
            page_content: "text".into(),
            metadata: Metadata::new(),
        };
        assert_eq!(doc.id(), None);
    }
}
