//! Late chunking: embed a whole document once, then pool per-sentence
//! token ranges out of the resulting token-level hidden states, instead of
//! embedding each chunk independently. Preserves cross-sentence context in
//! each chunk's vector. Windows documents that exceed the embedder's max
//! input length, with overlap, so no token is left unpooled.

use embed_model::{Chunk, Vector};

use crate::tokenizer_adapter::sentence_to_token_map;

use super::{Embedder as _, EmbedderError, OnnxStdIoEmbedder};

/// Overlap (in tokens) between adjacent windows when a document's sentence
/// spans span more text than the embedder accepts in one call.
const WINDOW_OVERLAP_TOKENS: usize = 64;

/// Produces one dense vector per sentence span recorded on `chunk`, pooled
/// from the embedder's per-token hidden states for the whole chunk text.
/// Requires `chunk.sentence_spans` to be populated (the chunker sets this
/// only when late chunking is requested).
pub fn embed_with_late_chunking(
    embedder: &OnnxStdIoEmbedder,
    chunk: &Chunk,
) -> Result<Vec<Vector>, EmbedderError> {
    let sentence_spans = chunk.sentence_spans.as_deref().unwrap_or(&[]);
    if sentence_spans.is_empty() {
        return Ok(Vec::new());
    }

    let max_length = embedder.max_input_length;
    let (encoding, token_vectors) = match embedder.embed_tokens(&chunk.text) {
        Ok(result) => result,
        Err(EmbedderError::InputTooLong { .. }) => {
            return embed_windowed(embedder, chunk, sentence_spans, max_length)
        }
        Err(err) => return Err(err),
    };

    let token_ranges = sentence_to_token_map(&encoding, sentence_spans);
    Ok(pool_ranges(&token_vectors, &token_ranges))
}

fn embed_windowed(
    embedder: &OnnxStdIoEmbedder,
    chunk: &Chunk,
    sentence_spans: &[(usize, usize)],
    max_length: usize,
) -> Result<Vec<Vector>, EmbedderError> {
    let mut vectors = Vec::with_capacity(sentence_spans.len());
    let window_chars = max_length.saturating_mul(4).max(1); // rough token->char budget
    let overlap_chars = WINDOW_OVERLAP_TOKENS.saturating_mul(4);

    let mut window_start = 0usize;
    while window_start < chunk.text.len() {
        let window_end = (window_start + window_chars).min(chunk.text.len());
        let window_text = &chunk.text[window_start..window_end];

        let (encoding, token_vectors) = embedder.embed_tokens(window_text)?;

        let local_spans: Vec<(usize, usize)> = sentence_spans
            .iter()
            .filter(|&&(s, e)| s >= window_start && e <= window_end)
            .map(|&(s, e)| (s - window_start, e - window_start))
            .collect();

        let token_ranges = sentence_to_token_map(&encoding, &local_spans);
        vectors.extend(pool_ranges(&token_vectors, &token_ranges));

        if window_end >= chunk.text.len() {
            break;
        }
        window_start = window_end.saturating_sub(overlap_chars).max(window_start + 1);
    }

    Ok(vectors)
}

fn pool_ranges(token_vectors: &[Vec<f32>], token_ranges: &[(usize, usize)]) -> Vec<Vector> {
    token_ranges
        .iter()
        .map(|&(start, end)| {
            if start >= end || token_vectors.is_empty() {
                return Vector::Dense(vec![0.0; token_vectors.first().map(Vec::len).unwrap_or(0)]);
            }
            let hidden = token_vectors[0].len();
            let mut pooled = vec![0f32; hidden];
            let mut count = 0f32;
            for row in &token_vectors[start..end.min(token_vectors.len())] {
                for (acc, v) in pooled.iter_mut().zip(row.iter()) {
                    *acc += v;
                }
                count += 1.0;
            }
            if count > 0.0 {
                for v in &mut pooled {
                    *v /= count;
                }
            }
            embed_model::l2_normalize(&mut pooled);
            Vector::Dense(pooled)
        })
        .collect()
}
