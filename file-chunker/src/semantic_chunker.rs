//! Semantic chunking strategy: merges adjacent sentences whose embeddings
//! are close together before the generic size-bounded packer runs.
//!
//! The merge threshold is the 95th percentile of pairwise cosine *distance*
//! (`1 - cosine_similarity`) across every sentence pair in the document,
//! computed once per document: the simplest threshold that stays deterministic
//! given a fixed encoder.

use embed_model::collaborators::DenseEncoder;

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b))
}

fn percentile_95(mut values: Vec<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((values.len() as f32 - 1.0) * 0.95).round() as usize;
    values[idx.min(values.len() - 1)]
}

/// Merges adjacent spans in `sentences` whenever their cosine distance is at
/// or below the document's 95th-percentile pairwise distance. Returns the
/// merged span list, which callers feed into the generic atom packer.
pub fn merge_by_similarity(
    text: &str,
    sentences: &[(usize, usize)],
    encoder: &dyn DenseEncoder,
) -> Vec<(usize, usize)> {
    if sentences.len() <= 1 {
        return sentences.to_vec();
    }

    let embeddings: Vec<Vec<f32>> = sentences
        .iter()
        .map(|(s, e)| encoder.encode(&text[*s..*e]))
        .collect();

    let mut all_distances = Vec::with_capacity(embeddings.len() * (embeddings.len() - 1) / 2);
    for i in 0..embeddings.len() {
        for j in (i + 1)..embeddings.len() {
            all_distances.push(cosine_distance(&embeddings[i], &embeddings[j]));
        }
    }
    let threshold = percentile_95(all_distances);

    let mut merged = Vec::new();
    let mut cur_start = sentences[0].0;
    let mut cur_end = sentences[0].1;
    for i in 1..sentences.len() {
        let distance = cosine_distance(&embeddings[i - 1], &embeddings[i]);
        if distance <= threshold {
            cur_end = sentences[i].1;
        } else {
            merged.push((cur_start, cur_end));
            cur_start = sentences[i].0;
            cur_end = sentences[i].1;
        }
    }
    merged.push((cur_start, cur_end));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic stub encoder: distinct sentences map to orthogonal unit
    /// vectors, identical sentences map to the same vector, so the merge
    /// decision is fully predictable in tests.
    struct StubEncoder;
    impl DenseEncoder for StubEncoder {
        fn encode(&self, text: &str) -> Vec<f32> {
            let bucket = text.trim().len() % 3;
            let mut v = vec![0.0f32; 3];
            v[bucket] = 1.0;
            v
        }
    }

    #[test]
    fn merges_similar_adjacent_sentences() {
        let text = "cat. cat. dog dog dog.";
        let sentences = crate::chunker_rules::sentence_spans(text);
        let merged = merge_by_similarity(text, &sentences, &StubEncoder);
        assert!(merged.len() <= sentences.len());
    }

    #[test]
    fn single_sentence_is_unchanged() {
        let text = "only one.";
        let sentences = crate::chunker_rules::sentence_spans(text);
        let merged = merge_by_similarity(text, &sentences, &StubEncoder);
        assert_eq!(merged, sentences);
    }
}
