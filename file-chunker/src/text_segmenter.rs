//! C2 Chunker: turns one `RawSegment::Text` into size-bounded `Chunk`s.
//!
//! Three strategies share a common shape: split into atoms (sentences or
//! words), then greedily pack atoms into chunks of at most `chunk_size`
//! characters, carrying `overlap` atoms into the next chunk. Semantic
//! chunking additionally merges adjacent atoms whose embeddings are close
//! before packing.

use embed_model::{metadata, Chunk, SourceMeta};

use crate::chunker_rules::{sentence_spans, word_spans};
use crate::semantic_chunker::merge_by_similarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    Sentence,
    Word,
    Semantic,
}

pub struct ChunkConfig<'a> {
    pub chunk_size: usize,
    pub overlap: usize,
    pub strategy: ChunkStrategy,
    /// Required when `strategy == Semantic`.
    pub semantic_encoder: Option<&'a dyn embed_model::collaborators::DenseEncoder>,
}

impl<'a> Default for ChunkConfig<'a> {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 0,
            strategy: ChunkStrategy::Sentence,
            semantic_encoder: None,
        }
    }
}

/// Chunk one document's (or one page's) text into `Chunk`s, attributing
/// `source` to every chunk produced.
pub fn chunk_text(text: &str, source: &SourceMeta, config: &ChunkConfig<'_>) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let atoms: Vec<(usize, usize)> = match config.strategy {
        ChunkStrategy::Sentence => sentence_spans(text),
        ChunkStrategy::Word => word_spans(text),
        ChunkStrategy::Semantic => {
            let sentences = sentence_spans(text);
            match config.semantic_encoder {
                Some(encoder) => merge_by_similarity(text, &sentences, encoder),
                None => sentences,
            }
        }
    };

    pack_atoms(text, &atoms, source, config)
}

fn pack_atoms(
    text: &str,
    atoms: &[(usize, usize)],
    source: &SourceMeta,
    config: &ChunkConfig<'_>,
) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut cur_start: Option<usize> = None;
    let mut cur_end = 0usize;
    let mut cur_atoms: Vec<(usize, usize)> = Vec::new();

    let flush = |out: &mut Vec<Chunk>, start: usize, end: usize, atoms: &[(usize, usize)]| {
        let chunk_text_str = text[start..end].trim();
        if chunk_text_str.is_empty() {
            return;
        }
        let mut chunk = Chunk::new(chunk_text_str, source.clone());
        chunk.sentence_spans = Some(
            atoms
                .iter()
                .map(|(a, b)| (a.saturating_sub(start), b.saturating_sub(start)))
                .collect(),
        );
        out.push(chunk);
    };

    for &(a_start, a_end) in atoms {
        let atom_len = a_end - a_start;

        if atom_len > config.chunk_size {
            // Flush whatever was pending, then emit the oversized atom alone.
            if let Some(s) = cur_start.take() {
                flush(&mut out, s, cur_end, &cur_atoms);
                cur_atoms.clear();
            }
            let mut chunk = Chunk::new(text[a_start..a_end].trim(), source.clone());
            chunk.chunk_too_large = true;
            chunk.sentence_spans = Some(vec![(0, a_end - a_start)]);
            out.push(chunk);
            continue;
        }

        match cur_start {
            None => {
                cur_start = Some(a_start);
                cur_end = a_end;
                cur_atoms.push((a_start, a_end));
            }
            Some(s) => {
                if a_end - s > config.chunk_size {
                    flush(&mut out, s, cur_end, &cur_atoms);
                    let overlap_atoms: Vec<(usize, usize)> = cur_atoms
                        .iter()
                        .rev()
                        .take(config.overlap)
                        .rev()
                        .copied()
                        .collect();
                    cur_start = overlap_atoms.first().map(|(s, _)| *s).or(Some(a_start));
                    cur_atoms = overlap_atoms;
                    cur_atoms.push((a_start, a_end));
                    cur_end = a_end;
                } else {
                    cur_end = a_end;
                    cur_atoms.push((a_start, a_end));
                }
            }
        }
    }
    if let Some(s) = cur_start {
        flush(&mut out, s, cur_end, &cur_atoms);
    }
    out
}

/// Attaches the `chunk_too_large` warning key to a chunk's eventual
/// `EmbedUnit` metadata map. Called by the embedder/driver once a `Chunk`
/// becomes an `EmbedUnit`.
pub fn seed_chunk_metadata(chunk: &Chunk, out: &mut std::collections::BTreeMap<String, String>) {
    if chunk.chunk_too_large {
        out.insert(metadata::CHUNK_TOO_LARGE.into(), "true".into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> SourceMeta {
        SourceMeta::for_path("/tmp/doc.txt")
    }

    #[test]
    fn sentence_strategy_respects_chunk_size() {
        let text = "One. Two. Three. Four. Five.";
        let config = ChunkConfig {
            chunk_size: 10,
            ..Default::default()
        };
        let chunks = chunk_text(text, &meta(), &config);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.len() <= 10 || c.chunk_too_large);
        }
    }

    #[test]
    fn word_strategy_packs_words() {
        let text = "alpha beta gamma delta epsilon";
        let config = ChunkConfig {
            chunk_size: 12,
            strategy: ChunkStrategy::Word,
            ..Default::default()
        };
        let chunks = chunk_text(text, &meta(), &config);
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn oversized_atom_is_emitted_intact_with_warning() {
        let long_word = "a".repeat(50);
        let config = ChunkConfig {
            chunk_size: 10,
            strategy: ChunkStrategy::Word,
            ..Default::default()
        };
        let chunks = chunk_text(&long_word, &meta(), &config);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].chunk_too_large);
        assert_eq!(chunks[0].text, long_word);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let config = ChunkConfig::default();
        assert!(chunk_text("   ", &meta(), &config).is_empty());
    }
}
