//! Shared data model for the embedding pipeline.
//!
//! These are the types that flow from source readers (`file-chunker`)
//! through the chunker, the tokenizer adapter and the embedder
//! (`embedding_provider`), and finally out through the driver
//! (`embed-pipeline`) to a sink (`vector-sink`).

pub mod collaborators;
pub mod metadata;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Dense, multi-vector, or sparse numeric output of an embedder.
///
/// Exactly one variant is ever produced by a given embedder instance; the
/// variant is fixed at construction, not per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Vector {
    /// A single fixed-length embedding (dense text, image-text).
    Dense(Vec<f32>),
    /// A sequence of per-token or per-patch vectors (late interaction, ColPali).
    MultiVector(Vec<Vec<f32>>),
    /// A sparse vocabulary-indexed mapping (Splade-style). Entries are `> 0`
    /// and indices are unique by construction.
    Sparse(BTreeMap<u32, f32>),
}

impl Vector {
    /// The per-row dimension, if this is a dense or multi-vector output.
    pub fn dense_dim(&self) -> Option<usize> {
        match self {
            Vector::Dense(v) => Some(v.len()),
            Vector::MultiVector(rows) => rows.first().map(Vec::len),
            Vector::Sparse(_) => None,
        }
    }

    /// L2 norm of a dense vector. `None` for multi-vector/sparse, which are
    /// normalized per-row or not at all.
    pub fn l2_norm(&self) -> Option<f32> {
        match self {
            Vector::Dense(v) => Some(l2_norm(v)),
            Vector::MultiVector(_) | Vector::Sparse(_) => None,
        }
    }
}

pub(crate) fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// L2-normalize a vector in place. A zero vector is left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// The atomic output of the pipeline: a vector, the text (or image path) it
/// describes, and structured metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedUnit {
    pub vector: Vector,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl EmbedUnit {
    pub fn new(vector: Vector, text: impl Into<String>) -> Self {
        Self {
            vector,
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// File-level and page-level provenance carried from a raw segment through
/// to every chunk derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMeta {
    /// Absolute path (or URL) of the source document.
    pub file_path: String,
    /// `file_path`'s final path component; duplicated for convenience since
    /// it is a required `EmbedUnit` metadata key.
    pub file_name: String,
    pub page_number: Option<u32>,
    pub created: Option<String>,
    pub modified: Option<String>,
    /// Set on units derived from audio or a sampled video frame.
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
    /// Set on units derived from a sampled video frame.
    pub frame_index: Option<u32>,
}

impl SourceMeta {
    pub fn for_path(file_path: impl Into<String>) -> Self {
        let file_path = file_path.into();
        let file_name = std::path::Path::new(&file_path)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.clone());
        Self {
            file_path,
            file_name,
            page_number: None,
            created: None,
            modified: None,
            start_ms: None,
            end_ms: None,
            frame_index: None,
        }
    }

    /// Seed an `EmbedUnit`'s metadata map with the required file-level keys.
    pub fn seed_metadata(&self, out: &mut BTreeMap<String, String>) {
        out.insert(metadata::FILE_NAME.into(), self.file_name.clone());
        out.insert(metadata::FILE_PATH.into(), self.file_path.clone());
        if let Some(page) = self.page_number {
            out.insert(metadata::PAGE_NUMBER.into(), page.to_string());
        }
        if let Some(created) = &self.created {
            out.insert(metadata::CREATED.into(), created.clone());
        }
        if let Some(modified) = &self.modified {
            out.insert(metadata::MODIFIED.into(), modified.clone());
        }
        if let Some(ms) = self.start_ms {
            out.insert(metadata::START_MS.into(), ms.to_string());
        }
        if let Some(ms) = self.end_ms {
            out.insert(metadata::END_MS.into(), ms.to_string());
        }
        if let Some(idx) = self.frame_index {
            out.insert(metadata::FRAME_INDEX.into(), idx.to_string());
        }
    }
}

/// One typed unit handed from a source reader (C1) to the chunker (C2).
#[derive(Debug, Clone)]
pub enum RawSegment {
    Text {
        content: String,
        source: SourceMeta,
        char_offset: usize,
    },
    Image {
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        source: SourceMeta,
    },
    AudioFrame {
        pcm_samples: Vec<f32>,
        sample_rate: u32,
        start_ms: u64,
        end_ms: u64,
        source: SourceMeta,
    },
}

impl RawSegment {
    pub fn source(&self) -> &SourceMeta {
        match self {
            RawSegment::Text { source, .. }
            | RawSegment::Image { source, .. }
            | RawSegment::AudioFrame { source, .. } => source,
        }
    }
}

/// A size-bounded, normalized span of text ready for tokenization, carrying
/// the metadata of the segment it was cut from.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub source: SourceMeta,
    /// Character spans of the sentences this chunk was assembled from,
    /// `[start, end)` into `text`. Populated only when late chunking is
    /// requested; the tokenizer adapter later maps these onto token ranges.
    pub sentence_spans: Option<Vec<(usize, usize)>>,
    /// Set when a single sentence/word atom alone exceeded the configured
    /// `chunk_size` and had to be emitted whole rather than split.
    pub chunk_too_large: bool,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: SourceMeta) -> Self {
        Self {
            text: text.into(),
            source,
            sentence_spans: None,
            chunk_too_large: false,
        }
    }
}

/// A decoded image ready for an image-text or document-page embedder.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source: SourceMeta,
}

/// The two shapes a batch element may take.
#[derive(Debug, Clone)]
pub enum EmbedInput {
    Chunk(Chunk),
    Image(ImageInput),
}

impl EmbedInput {
    pub fn source(&self) -> &SourceMeta {
        match self {
            EmbedInput::Chunk(c) => &c.source,
            EmbedInput::Image(i) => &i.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_unit_vector_stays_within_tolerance() {
        let mut v = vec![3.0_f32, 4.0];
        l2_normalize(&mut v);
        let norm = l2_norm(&v);
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn l2_normalize_zero_vector_is_unchanged() {
        let mut v = vec![0.0_f32; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0_f32; 4]);
    }

    #[test]
    fn source_meta_seeds_required_keys() {
        let mut meta = SourceMeta::for_path("/tmp/report.pdf");
        meta.page_number = Some(2);
        let mut map = BTreeMap::new();
        meta.seed_metadata(&mut map);
        assert_eq!(map.get(metadata::FILE_NAME).unwrap(), "report.pdf");
        assert_eq!(map.get(metadata::PAGE_NUMBER).unwrap(), "2");
    }
}
