use std::io::Write;

use embed_model::Vector;
use embedding_provider::config::{ConfigError, Dtype, EmbedderSettings, ModelSource};
use embedding_provider::embedder::{Family, OnnxHttpConfig, OnnxHttpEmbedder};
use embed_pipeline::{CancellationToken, PipelineConfig};
use vector_sink::{IndexOptions, InMemorySink, Metric, Sink};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn mock_embedder() -> OnnxHttpEmbedder {
    OnnxHttpEmbedder::new(OnnxHttpConfig {
        endpoint: "http://localhost:9000/embed".into(),
        auth_token: None,
        dimension: 8,
        max_input_length: 2048,
        embedding_model_id: "mock".into(),
        text_repr_version: "v1".into(),
    })
    .expect("valid mock embedder config")
}

#[test]
fn embed_query_returns_one_unit_per_input_string() {
    init_tracing();
    let embedder = mock_embedder();
    let texts = vec!["hybrid search over chunks".to_string(), "second query".to_string()];
    let units = embed_pipeline::ops::embed_query(&embedder, &texts, None).unwrap();

    assert_eq!(units.len(), 2);
    for unit in &units {
        match &unit.vector {
            Vector::Dense(v) => assert_eq!(v.len(), 8),
            other => panic!("expected dense vector, got {other:?}"),
        }
    }
}

#[test]
fn embed_file_chunks_and_upserts_every_chunk() {
    init_tracing();
    let embedder = mock_embedder();
    let sink = InMemorySink::new();
    sink.create_index("docs", 8, Metric::Cosine, &IndexOptions::new()).unwrap();

    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "Rust makes systems code safer. It does this without a garbage collector. That tradeoff defines the language.").unwrap();

    let mut config = PipelineConfig::default();
    config.chunk.chunk_size = 40;
    config.index_name = "docs".into();
    let cancel = CancellationToken::new();

    let report =
        embed_pipeline::ops::embed_file(&embedder, Some(&sink), file.path(), &config, &cancel).unwrap();

    assert_eq!(report.succeeded, 1);
    assert!(report.failed.is_empty());
    assert!(!sink.documents("docs").is_empty());
}

#[test]
fn embed_file_without_sink_returns_units_directly() {
    init_tracing();
    let embedder = mock_embedder();

    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "Rust makes systems code safer. It does this without a garbage collector.").unwrap();

    let mut config = PipelineConfig::default();
    config.chunk.chunk_size = 40;
    let cancel = CancellationToken::new();

    let report = embed_pipeline::ops::embed_file::<InMemorySink>(
        &embedder,
        None,
        file.path(),
        &config,
        &cancel,
    )
    .unwrap();

    assert_eq!(report.succeeded, 1);
    assert!(!report.units.is_empty());
}

#[test]
fn late_chunking_rejected_for_non_dense_family() {
    let settings = EmbedderSettings {
        family: Family::SparseText,
        dtype: Dtype::F32,
        late_chunking: true,
        dimension: 30000,
        max_input_length: 512,
        embedding_model_id: "splade-mock".into(),
        text_repr_version: "v1".into(),
        runtime_library_path: std::path::PathBuf::from("/nonexistent/onnxruntime.so"),
    };

    let err = embedding_provider::config::from_local(
        ModelSource::Local { base_dir: std::path::PathBuf::from("/nonexistent") },
        settings,
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::UnsupportedConfiguration { family: Family::SparseText }));
}
