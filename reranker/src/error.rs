use thiserror::Error;

/// Errors that can be produced by cross-encoder scoring.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RerankerError {
    #[error("invalid reranker configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("(query, document) pair exceeds max length of {max_length} tokens, actual length: {actual_length}")]
    InputTooLong { max_length: usize, actual_length: usize },
    #[error("provider failure: {message}")]
    ProviderFailure { message: String },
}
