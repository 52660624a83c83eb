//! C6: cross-encoder scoring and top-k reranking over candidate documents.

pub mod config;
pub mod cross_encoder;
pub mod error;
pub mod template;

pub use cross_encoder::{CrossEncoder, CrossEncoderConfig, ScoringHead};
pub use error::RerankerError;
pub use template::PromptTemplate;

/// One document's rank and score within a single query's results.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDocument {
    pub rank: usize,
    pub score: f32,
    pub text: String,
}

/// A single query's reranked documents.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankResult {
    pub query: String,
    pub documents: Vec<RankedDocument>,
}

/// Scores every `query x document` pair and returns, for each query, one
/// score per document in `documents`' original order.
pub fn compute_scores(
    reranker: &CrossEncoder,
    queries: &[&str],
    documents: &[&str],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, RerankerError> {
    let mut rows = Vec::with_capacity(queries.len());
    for query in queries {
        let pairs: Vec<(&str, &str)> = documents.iter().map(|document| (*query, *document)).collect();
        rows.push(reranker.score_pairs(&pairs, batch_size)?);
    }
    Ok(rows)
}

/// Scores every `query x document` pair, then for each query sorts documents
/// by descending score and keeps the top `top_k` with 1-based ranks. Ties
/// are broken by original input order.
pub fn rerank(
    reranker: &CrossEncoder,
    queries: &[&str],
    documents: &[&str],
    top_k: usize,
) -> Result<Vec<RerankResult>, RerankerError> {
    let scores = compute_scores(reranker, queries, documents, documents.len().max(1))?;

    Ok(queries
        .iter()
        .zip(scores)
        .map(|(query, query_scores)| {
            let mut ranked: Vec<(usize, f32)> = query_scores.into_iter().enumerate().collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            let documents = ranked
                .into_iter()
                .take(top_k)
                .enumerate()
                .map(|(rank, (index, score))| RankedDocument {
                    rank: rank + 1,
                    score,
                    text: documents[index].to_string(),
                })
                .collect();

            RerankResult {
                query: query.to_string(),
                documents,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rerank_output_has_descending_scores_and_one_based_ranks() {
        let result = RerankResult {
            query: "q".into(),
            documents: vec![
                RankedDocument { rank: 1, score: 0.9, text: "a".into() },
                RankedDocument { rank: 2, score: 0.4, text: "b".into() },
                RankedDocument { rank: 3, score: 0.1, text: "c".into() },
            ],
        };
        for window in result.documents.windows(2) {
            assert!(window[0].score >= window[1].score);
            assert_eq!(window[1].rank, window[0].rank + 1);
        }
    }
}
