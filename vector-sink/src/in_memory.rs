use std::collections::HashMap;
use std::sync::Mutex;

use embed_model::EmbedUnit;

use crate::error::SinkError;
use crate::{IndexOptions, Metric, Sink};

struct Index {
    dimension: usize,
    metric: Metric,
    documents: Vec<EmbedUnit>,
}

/// Reference [`Sink`] implementation backed by an in-process map. Useful for
/// tests and as the default target when no real vector store is wired in.
///
/// Idempotence is the adapter's burden: this
/// sink does not deduplicate by id on `upsert`, so re-delivering the same
/// batch after a retry appends it again. Combined with the driver's
/// at-least-once retry policy, a downstream reader must tolerate duplicates.
#[derive(Default)]
pub struct InMemorySink {
    indices: Mutex<HashMap<String, Index>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything currently upserted into `index_name`, in
    /// upsert order duplicates included.
    pub fn documents(&self, index_name: &str) -> Vec<EmbedUnit> {
        self.indices
            .lock()
            .unwrap()
            .get(index_name)
            .map(|index| index.documents.clone())
            .unwrap_or_default()
    }

    /// The metric `index_name` was created with, if it exists.
    pub fn metric(&self, index_name: &str) -> Option<Metric> {
        self.indices.lock().unwrap().get(index_name).map(|index| index.metric)
    }
}

impl Sink for InMemorySink {
    type Document = EmbedUnit;

    fn create_index(
        &self,
        index_name: &str,
        dimension: usize,
        metric: Metric,
        _options: &IndexOptions,
    ) -> Result<(), SinkError> {
        let mut indices = self.indices.lock().unwrap();
        if indices.contains_key(index_name) {
            return Err(SinkError::Permanent(format!(
                "index `{index_name}` already exists"
            )));
        }
        indices.insert(
            index_name.to_string(),
            Index { dimension, metric, documents: Vec::new() },
        );
        Ok(())
    }

    fn delete_index(&self, index_name: &str) -> Result<(), SinkError> {
        let mut indices = self.indices.lock().unwrap();
        indices.remove(index_name).ok_or_else(|| {
            SinkError::Permanent(format!("index `{index_name}` does not exist"))
        })?;
        Ok(())
    }

    fn convert(&self, unit: &EmbedUnit) -> Self::Document {
        unit.clone()
    }

    fn upsert(&self, index_name: &str, documents: Vec<Self::Document>) -> Result<(), SinkError> {
        let mut indices = self.indices.lock().unwrap();
        let index = indices.get_mut(index_name).ok_or_else(|| {
            SinkError::Permanent(format!("index `{index_name}` does not exist"))
        })?;

        for document in &documents {
            if let Some(dim) = document.vector.dense_dim() {
                if dim != index.dimension {
                    return Err(SinkError::Permanent(format!(
                        "document dimension {dim} does not match index dimension {}",
                        index.dimension
                    )));
                }
            }
        }

        index.documents.extend(documents);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed_model::Vector;

    fn no_options() -> IndexOptions {
        IndexOptions::new()
    }

    #[test]
    fn upsert_appends_on_repeat_delivery() {
        let sink = InMemorySink::new();
        sink.create_index("docs", 3, Metric::Cosine, &no_options()).unwrap();

        let unit = EmbedUnit::new(Vector::Dense(vec![0.1, 0.2, 0.3]), "hello world");
        sink.upsert("docs", vec![unit.clone()]).unwrap();
        sink.upsert("docs", vec![unit]).unwrap();

        assert_eq!(sink.documents("docs").len(), 2);
    }

    #[test]
    fn upsert_rejects_dimension_mismatch() {
        let sink = InMemorySink::new();
        sink.create_index("docs", 4, Metric::Cosine, &no_options()).unwrap();

        let unit = EmbedUnit::new(Vector::Dense(vec![0.1, 0.2, 0.3]), "hello world");
        let err = sink.upsert("docs", vec![unit]).unwrap_err();
        assert!(matches!(err, SinkError::Permanent(_)));
    }

    #[test]
    fn create_index_twice_is_a_permanent_error() {
        let sink = InMemorySink::new();
        sink.create_index("docs", 3, Metric::Cosine, &no_options()).unwrap();
        let err = sink.create_index("docs", 3, Metric::Cosine, &no_options()).unwrap_err();
        assert!(matches!(err, SinkError::Permanent(_)));
    }

    #[test]
    fn delete_unknown_index_is_a_permanent_error() {
        let sink = InMemorySink::new();
        let err = sink.delete_index("missing").unwrap_err();
        assert!(matches!(err, SinkError::Permanent(_)));
    }

    #[test]
    fn create_index_records_the_requested_metric() {
        let sink = InMemorySink::new();
        sink.create_index("docs", 3, Metric::Dot, &no_options()).unwrap();
        assert_eq!(sink.metric("docs"), Some(Metric::Dot));
    }
}
