//! C7: the Adapter / Sink Contract. A [`Sink`] owns index lifecycle and
//! upserts; it does not own retry policy (the driver retries transient
//! failures with backoff) or transactionality (non-goal).

pub mod error;
pub mod in_memory;

pub use error::SinkError;
pub use in_memory::InMemorySink;

use std::collections::BTreeMap;

use embed_model::EmbedUnit;

/// Distance function an index is built for. Adapters that only support one
/// metric should reject the others with `SinkError::Permanent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cosine,
    Dot,
    Euclidean,
}

/// Freeform adapter-specific settings (e.g. `ef_construction`, shard count),
/// passed through to `create_index` verbatim.
pub type IndexOptions = BTreeMap<String, String>;

/// What a vector store adapter must provide. `Document` is the adapter's
/// own wire/row representation; `convert` is where an `EmbedUnit` gets
/// turned into it, separate from `upsert` so a driver can convert once and
/// retry the upsert without re-converting.
pub trait Sink: Send + Sync {
    type Document;

    fn create_index(
        &self,
        index_name: &str,
        dimension: usize,
        metric: Metric,
        options: &IndexOptions,
    ) -> Result<(), SinkError>;
    fn delete_index(&self, index_name: &str) -> Result<(), SinkError>;
    fn convert(&self, unit: &EmbedUnit) -> Self::Document;
    fn upsert(&self, index_name: &str, documents: Vec<Self::Document>) -> Result<(), SinkError>;
}
