use reranker::config::default_cross_encoder_config;
use reranker::CrossEncoder;

fn load_reranker() -> CrossEncoder {
    CrossEncoder::new(default_cross_encoder_config()).expect("configuration is valid and model loads")
}

#[test]
fn rerank_orders_candidates_by_relevance_and_honors_top_k() {
    let model = load_reranker();

    let queries = ["What is machine learning?"];
    let documents = [
        "Machine learning is a subset of artificial intelligence.",
        "The weather is sunny today in New York.",
        "Deep learning uses neural networks for pattern recognition.",
        "The capital of France is Paris.",
        "Neural networks are inspired by biological brain structures.",
        "Cooking is a useful skill.",
    ];

    let results = reranker::rerank(&model, &queries, &documents, 3).expect("rerank succeeds");

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.query, queries[0]);
    assert_eq!(result.documents.len(), 3);

    for window in result.documents.windows(2) {
        assert!(window[0].score >= window[1].score);
        assert_eq!(window[1].rank, window[0].rank + 1);
    }
    assert_eq!(result.documents[0].rank, 1);
}

#[test]
fn compute_scores_returns_one_row_per_query_and_one_score_per_document() {
    let model = load_reranker();

    let queries = ["How to make coffee?", "Tell me about cats"];
    let documents = [
        "Coffee is made by brewing ground coffee beans with hot water.",
        "Cats are domesticated mammals and popular pets.",
        "The weather is nice today.",
    ];

    let scores =
        reranker::compute_scores(&model, &queries, &documents, 2).expect("compute_scores succeeds");

    assert_eq!(scores.len(), queries.len());
    for row in &scores {
        assert_eq!(row.len(), documents.len());
        for &score in row {
            assert!((0.0..=1.0).contains(&score));
        }
    }
}

#[test]
fn rerank_with_empty_documents_returns_an_empty_ranking() {
    let model = load_reranker();
    let queries = ["anything"];
    let documents: [&str; 0] = [];

    let results = reranker::rerank(&model, &queries, &documents, 5).expect("rerank succeeds");
    assert_eq!(results.len(), 1);
    assert!(results[0].documents.is_empty());
}
