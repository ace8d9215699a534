//! Embedding batcher.
//!
//! Splits a document sequence into contiguous sub-batches, embeds every
//! document of one sub-batch concurrently, and hands each completed batch
//! of vectors to a callback. The callback fully completes (including its
//! own awaits) before the next sub-batch starts embedding, which caps
//! in-flight model calls at `batch_size` and unsent vectors at one batch.

use anyhow::Result;
use futures_util::future::try_join_all;
use std::future::Future;
use uuid::Uuid;

use crate::embedding::EmbeddingModel;
use crate::models::{Document, EmbeddingVector, Metadata};

/// Embed `documents` in sub-batches of at most `batch_size`, invoking
/// `on_batch` once per completed sub-batch with vectors in input order.
///
/// Any single embedding failure fails its whole sub-batch: the callback is
/// not invoked for it and the error propagates. Sub-batches already handed
/// to the callback stay valid.
pub async fn embed_batch<F, Fut>(
    model: &dyn EmbeddingModel,
    documents: &[Document],
    batch_size: usize,
    use_dataset_ids: bool,
    mut on_batch: F,
) -> Result<()>
where
    F: FnMut(Vec<EmbeddingVector>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    assert!(batch_size >= 1, "batch_size must be >= 1");

    for sub_batch in documents.chunks(batch_size) {
        let vectors = try_join_all(
            sub_batch
                .iter()
                .map(|doc| embed_document(model, doc, use_dataset_ids)),
        )
        .await?;
        on_batch(vectors).await?;
    }

    Ok(())
}

/// Embed one document into a vector. The vector id comes from the
/// document's metadata when dataset ids are enabled and present; otherwise
/// a fresh UUID is generated. Metadata is carried over verbatim, or
/// replaced by `{"text": page_content}` when the document has none.
async fn embed_document(
    model: &dyn EmbeddingModel,
    doc: &Document,
    use_dataset_ids: bool,
) -> Result<EmbeddingVector> {
    let values = model.embed(&doc.page_content).await?;

    let id = if use_dataset_ids {
        doc.id().map(str::to_string)
    } else {
        None
    }
    .unwrap_or_else(|| Uuid::new_v4().to_string());

    let metadata = if doc.metadata.is_empty() {
        let mut metadata = Metadata::new();
        metadata.insert(
            "text".into(),
            serde_json::Value::String(doc.page_content.clone()),
        );
        metadata
    } else {
        doc.metadata.clone()
    };

    Ok(EmbeddingVector {
        id,
        values,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Fake model that records every embed call and can fail on a chosen
    /// call number (1-based).
    struct FakeModel {
        trace: Arc<Mutex<Vec<String>>>,
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    impl FakeModel {
        fn new(trace: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                trace,
                calls: AtomicUsize::new(0),
                fail_on_call: None,
            }
        }

        fn failing_on(trace: Arc<Mutex<Vec<String>>>, call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::new(trace)
            }
        }
    }

    #[async_trait]
    impl EmbeddingModel for FakeModel {
        fn model_name(&self) -> &str {
            "fake"
        }
        fn dims(&self) -> usize {
            3
        }
        async fn init(&self) -> Result<()> {
            Ok(())
        }
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.trace.lock().unwrap().push(format!("embed {}", text));
            if self.fail_on_call == Some(call) {
                bail!("embedding model exploded");
            }
            Ok(vec![text.len() as f32, 0.0, 0.0])
        }
    }

    fn doc(id: &str) -> Document {
        crate::models::SquadRecord {
            id: id.to_string(),
            context: format!("context of {}", id),
            question: "q".to_string(),
            answer: "a".to_string(),
        }
        .into_document()
    }

    fn bare_doc(text: &str) -> Document {
        Document {
            page_content: text.to_string(),
            metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn callback_count_and_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let model = FakeModel::new(trace);
        let docs: Vec<Document> = (0..7).map(|i| doc(&format!("d{}", i))).collect();

        let batches = Arc::new(Mutex::new(Vec::new()));
        let sink = batches.clone();
        embed_batch(&model, &docs, 3, true, |vectors| {
            let sink = sink.clone();
            async move {
                sink.lock()
                    .unwrap()
                    .push(vectors.iter().map(|v| v.id.clone()).collect::<Vec<_>>());
                Ok(())
            }
        })
        .await
        .unwrap();

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 3); // ceil(7/3)
        assert_eq!(batches[0], vec!["d0", "d1", "d2"]);
        assert_eq!(batches[1], vec!["d3", "d4", "d5"]);
        assert_eq!(batches[2], vec!["d6"]);
    }

    #[tokio::test]
    async fn sequential_backpressure() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let model = FakeModel::new(trace.clone());
        let docs: Vec<Document> = (0..6).map(|i| doc(&format!("d{}", i))).collect();

        let mut batch_no = 0usize;
        let cb_trace = trace.clone();
        embed_batch(&model, &docs, 3, true, |_vectors| {
            let cb_trace = cb_trace.clone();
            let n = batch_no;
            batch_no += 1;
            async move {
                cb_trace.lock().unwrap().push(format!("callback {}", n));
                Ok(())
            }
        })
        .await
        .unwrap();

        let trace = trace.lock().unwrap();
        let pos = |entry: &str| trace.iter().position(|t| t == entry).unwrap();
        // Every embed of sub-batch 1 happens after sub-batch 0's callback
        // returned.
        for i in 3..6 {
            assert!(
                pos(&format!("embed context of d{}", i)) > pos("callback 0"),
                "trace: {:?}",
                *trace
            );
        }
        for i in 0..3 {
            assert!(pos(&format!("embed context of d{}", i)) < pos("callback 0"));
        }
    }

    #[tokio::test]
    async fn dataset_id_is_stable() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let model = FakeModel::new(trace);
        let vector = embed_document(&model, &doc("x"), true).await.unwrap();
        assert_eq!(vector.id, "x");
        assert_eq!(vector.metadata["question"], "q");
    }

    #[tokio::test]
    async fn missing_id_gets_fresh_unique_ids() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let model = FakeModel::new(trace);
        let a = embed_document(&model, &bare_doc("alpha"), true).await.unwrap();
        let b = embed_document(&model, &bare_doc("beta"), true).await.unwrap();
        assert_ne!(a.id, b.id);
        // No metadata on the document means the text itself is carried.
        assert_eq!(a.metadata["text"], "alpha");
    }

    #[tokio::test]
    async fn dataset_ids_disabled_regenerates() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let model = FakeModel::new(trace);
        let vector = embed_document(&model, &doc("keep-me"), false).await.unwrap();
        assert_ne!(vector.id, "keep-me");
        // Metadata still travels verbatim.
        assert_eq!(vector.metadata["id"], "keep-me");
    }

    #[tokio::test]
    async fn mid_batch_failure_skips_callback_and_propagates() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        // Third embed call of the first (only) sub-batch fails.
        let model = FakeModel::failing_on(trace, 3);
        let docs: Vec<Document> = (0..5).map(|i| doc(&format!("d{}", i))).collect();

        let invoked = Arc::new(AtomicUsize::new(0));
        let counter = invoked.clone();
        let err = embed_batch(&model, &docs, 5, true, |_vectors| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("embedding model exploded"));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn callback_error_stops_later_batches() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let model = FakeModel::new(trace.clone());
        let docs: Vec<Document> = (0..6).map(|i| doc(&format!("d{}", i))).collect();

        let err = embed_batch(&model, &docs, 2, true, |_vectors| async {
            bail!("sink rejected batch")
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("sink rejected batch"));
        // Only the first sub-batch was ever embedded.
        assert_eq!(trace.lock().unwrap().len(), 2);
    }
}
