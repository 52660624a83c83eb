//! C3 Tokenizer Adapter + C4 Embedder.
//!
//! [`embedder`] holds one module per embedding family (dense text, sparse
//! text, late-interaction text, image-text, document-page image), all
//! implementing the [`embedder::Embedder`] capability trait. [`config`]
//! resolves a [`config::ModelSource`] + [`config::EmbedderSettings`] pair
//! into a boxed embedder. [`tokenizer_adapter`] bridges the chunker's
//! character offsets to an embedder's token indices for late chunking.

pub mod config;
pub mod embedder;
pub mod tokenizer_adapter;

pub use config::{ConfigError, Dtype, EmbedderSettings, ModelSource};
pub use embedder::{Embedder, EmbedderError, EmbedderInfo, Family, ProviderKind};
