//! C5: the pipeline driver, plus the public operations a caller actually
//! invokes. [`driver`] is the generic staged runner; [`ops`] wraps it with
//! the handful of entry points callers need (embed a single query, embed a
//! file, a whole directory, a webpage, ...).

pub mod config;
pub mod driver;
pub mod error;
pub mod ops;

pub use config::{PipelineConfig, RetryConfig};
pub use driver::{CancellationToken, CollectingPipeline, EmbedPipeline, RunReport};
pub use error::PipelineError;
