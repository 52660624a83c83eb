use thiserror::Error;

/// Errors a [`crate::Sink`] can report. The distinction between `Transient`
/// and `Permanent` is what lets the driver's retry-with-backoff loop
/// decide whether to retry or give up immediately.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Worth retrying: a dropped connection, a timeout, a rate limit.
    #[error("transient sink failure: {0}")]
    Transient(String),
    /// Not worth retrying: a schema mismatch, a rejected document, bad auth.
    #[error("permanent sink failure: {0}")]
    Permanent(String),
}
