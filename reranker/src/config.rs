use std::path::PathBuf;

use crate::cross_encoder::{CrossEncoderConfig, ScoringHead};
use crate::template::PromptTemplate;

/// Default settings for the bundled Qwen3-style cross-encoder.
#[derive(Debug, Clone, Copy)]
pub struct CrossEncoderDefaults {
    pub model_path: &'static str,
    pub tokenizer_path: &'static str,
    pub runtime_dll_path: &'static str,
    pub max_input_tokens: usize,
    pub model_id: &'static str,
}

/// Shared defaults so tests and callers stay in sync.
pub const CROSS_ENCODER_DEFAULTS: CrossEncoderDefaults = CrossEncoderDefaults {
    model_path: "models/qwen3-reranker-0.6b-onnx/model.onnx",
    tokenizer_path: "models/qwen3-reranker-0.6b-onnx/tokenizer.json",
    runtime_dll_path: "bin/onnxruntime-win-x64-1.23.1/lib/onnxruntime.dll",
    max_input_tokens: 4096,
    model_id: "qwen3-reranker-0.6b-onnx",
};

/// Convenience helper to build a [`CrossEncoderConfig`] from the shared
/// defaults, resolving asset paths relative to this crate's directory.
pub fn default_cross_encoder_config() -> CrossEncoderConfig {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    CrossEncoderConfig {
        model_path: base.join(CROSS_ENCODER_DEFAULTS.model_path),
        tokenizer_path: base.join(CROSS_ENCODER_DEFAULTS.tokenizer_path),
        runtime_library_path: base.join(CROSS_ENCODER_DEFAULTS.runtime_dll_path),
        template: PromptTemplate::default_qwen3(),
        scoring_head: ScoringHead::Sigmoid,
        max_input_length: CROSS_ENCODER_DEFAULTS.max_input_tokens,
        model_id: CROSS_ENCODER_DEFAULTS.model_id.into(),
    }
}
