use embedding_provider::EmbedderError;
use file_chunker::error::SourceError;
use thiserror::Error;
use vector_sink::SinkError;

/// Errors surfaced by the driver (C5). A single source failing does not
/// necessarily abort the run: see [`crate::config::PipelineConfig::continue_on_error`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reading source failed: {0}")]
    Source(#[from] SourceError),
    #[error("embedding failed: {0}")]
    Embed(#[from] EmbedderError),
    #[error("sink failed after exhausting retries: {0}")]
    Sink(#[from] SinkError),
    #[error("pipeline was cancelled before completion")]
    Cancelled,
    #[error("a worker thread panicked: {0}")]
    WorkerPanicked(String),
}
