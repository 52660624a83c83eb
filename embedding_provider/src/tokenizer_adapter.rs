//! C3: the contract between the chunker's character-offset `Chunk`s and an
//! embedder's token-indexed model input. `sentence_to_token_map` is what
//! lets late chunking pool a whole document's token-level hidden states
//! back down to per-sentence vectors.

use tokenizers::Encoding;

/// Maps each `[start, end)` character span onto the `[start, end)` token
/// index range that covers it. A sentence with no covering tokens (can
/// happen for whitespace-only spans, or special tokens with an empty
/// offset) maps to an empty `(0, 0)` range.
pub fn sentence_to_token_map(encoding: &Encoding, sentence_spans: &[(usize, usize)]) -> Vec<(usize, usize)> {
    map_offsets_to_tokens(encoding.get_offsets(), sentence_spans)
}

fn map_offsets_to_tokens(
    offsets: &[(usize, usize)],
    sentence_spans: &[(usize, usize)],
) -> Vec<(usize, usize)> {
    sentence_spans
        .iter()
        .map(|&(char_start, char_end)| {
            let mut token_start = None;
            let mut token_end = 0;
            for (token_index, &(off_start, off_end)) in offsets.iter().enumerate() {
                if off_start == off_end {
                    continue;
                }
                if off_start < char_end && off_end > char_start {
                    if token_start.is_none() {
                        token_start = Some(token_index);
                    }
                    token_end = token_index + 1;
                }
            }
            match token_start {
                Some(start) => (start, token_end),
                None => (0, 0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_sentence_spans_onto_covering_token_ranges() {
        // "Hi there. Bye." tokenized roughly as ["Hi", "there", ".", "Bye", "."]
        // with char offsets, plus a leading/trailing special token with an
        // empty offset that must be skipped.
        let offsets = vec![(0, 0), (0, 2), (3, 8), (8, 9), (10, 13), (13, 14), (0, 0)];
        let sentence_spans = vec![(0, 9), (10, 14)];
        let map = map_offsets_to_tokens(&offsets, &sentence_spans);
        assert_eq!(map, vec![(1, 4), (4, 6)]);
    }

    #[test]
    fn span_with_no_covering_tokens_maps_to_empty_range() {
        let offsets = vec![(0, 0)];
        let map = map_offsets_to_tokens(&offsets, &[(0, 5)]);
        assert_eq!(map, vec![(0, 0)]);
    }
}
