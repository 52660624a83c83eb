use std::path::PathBuf;

use thiserror::Error;

use crate::embedder::{
    colbert::{ColbertConfig, ColbertEmbedder},
    colpali::{ColpaliConfig, ColpaliEmbedder},
    image_text::{ImageTextConfig, ImageTextEmbedder},
    sparse::{SpladeConfig, SpladeEmbedder},
    Embedder, EmbedderError, Family, OnnxHttpConfig, OnnxHttpEmbedder, OnnxStdIoConfig, OnnxStdIoEmbedder,
};

/// Numeric precision a model's weights are loaded in. Chosen at config
/// time; the embedder itself is precision-agnostic once the ONNX graph is
/// loaded (ONNX Runtime handles the cast), so this only picks which model
/// artifact to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    F32,
    F16,
    Bf16,
    Q4F16,
    Q8,
}

impl Dtype {
    /// The filename suffix convention used by model repositories that
    /// publish multiple quantizations side by side (e.g. `model_q8.onnx`).
    pub fn file_suffix(self) -> &'static str {
        match self {
            Dtype::F32 => "",
            Dtype::F16 => "_fp16",
            Dtype::Bf16 => "_bf16",
            Dtype::Q4F16 => "_q4f16",
            Dtype::Q8 => "_q8",
        }
    }
}

/// Where a model's weights and tokenizer are resolved from.
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Files already present on local disk.
    Local { base_dir: PathBuf },
    /// A Hugging Face Hub repository, fetched (and cached) on first use.
    Hub { repo_id: String, revision: String },
    /// An explicit ONNX model/tokenizer pair, bypassing repo conventions.
    Onnx { model_path: PathBuf, tokenizer_path: PathBuf },
    /// A model served behind an HTTP endpoint rather than run in-process.
    Cloud { endpoint: String, auth_token: Option<String> },
}

/// Settings that, together with a [`ModelSource`], fully determine which
/// embedder gets constructed and how.
#[derive(Debug, Clone)]
pub struct EmbedderSettings {
    pub family: Family,
    pub dtype: Dtype,
    /// Late chunking pools one document-level pass into per-sentence
    /// vectors; it only makes sense for families that produce per-token
    /// hidden states and are pooled to `Vector::Dense`.
    pub late_chunking: bool,
    pub dimension: usize,
    pub max_input_length: usize,
    pub embedding_model_id: String,
    pub text_repr_version: String,
    pub runtime_library_path: PathBuf,
}

/// Errors raised validating or resolving an [`EmbedderSettings`] /
/// [`ModelSource`] pair, before any model is actually loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{family:?} does not support late chunking; only dense-text pooling is incremental over token ranges")]
    UnsupportedConfiguration { family: Family },
    #[error("model source does not provide the file(s) {family:?} requires: {reason}")]
    IncompleteModelSource { family: Family, reason: String },
    #[error(transparent)]
    Embedder(#[from] EmbedderError),
}

fn validate(settings: &EmbedderSettings) -> Result<(), ConfigError> {
    if settings.late_chunking && settings.family != Family::DenseText {
        return Err(ConfigError::UnsupportedConfiguration { family: settings.family });
    }
    Ok(())
}

fn require_onnx_paths(source: &ModelSource, family: Family) -> Result<(PathBuf, PathBuf), ConfigError> {
    match source {
        ModelSource::Local { base_dir } => Ok((base_dir.join("model.onnx"), base_dir.join("tokenizer.json"))),
        ModelSource::Hub { .. } => Err(ConfigError::IncompleteModelSource {
            family,
            reason: "hub sources must be materialized to a local cache before construction; call resolve_hub() first".into(),
        }),
        ModelSource::Onnx { model_path, tokenizer_path } => Ok((model_path.clone(), tokenizer_path.clone())),
        ModelSource::Cloud { .. } => Err(ConfigError::IncompleteModelSource {
            family,
            reason: "cloud sources build an HTTP embedder, not a local ONNX session".into(),
        }),
    }
}

/// Builds an embedder from files already on local disk.
pub fn from_local(source: ModelSource, settings: EmbedderSettings) -> Result<Box<dyn Embedder>, ConfigError> {
    validate(&settings)?;
    from_onnx(source, settings)
}

/// Builds an embedder from an explicit ONNX model/tokenizer pair, or a
/// `Local`/`Hub`-resolved directory following the `model.onnx` +
/// `tokenizer.json` convention.
pub fn from_onnx(source: ModelSource, settings: EmbedderSettings) -> Result<Box<dyn Embedder>, ConfigError> {
    validate(&settings)?;
    let (model_path, tokenizer_path) = require_onnx_paths(&source, settings.family)?;

    let embedder: Box<dyn Embedder> = match settings.family {
        Family::DenseText => Box::new(OnnxStdIoEmbedder::new(OnnxStdIoConfig {
            model_path,
            tokenizer_path,
            runtime_library_path: settings.runtime_library_path,
            dimension: settings.dimension,
            max_input_length: settings.max_input_length,
            embedding_model_id: settings.embedding_model_id,
            text_repr_version: settings.text_repr_version,
        })?),
        Family::SparseText => Box::new(SpladeEmbedder::new(SpladeConfig {
            model_path,
            tokenizer_path,
            runtime_library_path: settings.runtime_library_path,
            vocab_size: settings.dimension,
            max_input_length: settings.max_input_length,
            embedding_model_id: settings.embedding_model_id,
            text_repr_version: settings.text_repr_version,
        })?),
        Family::LateInteractionText => Box::new(ColbertEmbedder::new(ColbertConfig {
            model_path,
            tokenizer_path,
            runtime_library_path: settings.runtime_library_path,
            dimension: settings.dimension,
            max_input_length: settings.max_input_length,
            embedding_model_id: settings.embedding_model_id,
            text_repr_version: settings.text_repr_version,
        })?),
        Family::DocumentPageImage => Box::new(ColpaliEmbedder::new(ColpaliConfig {
            model_path,
            runtime_library_path: settings.runtime_library_path,
            dimension: settings.dimension,
            embedding_model_id: settings.embedding_model_id,
            text_repr_version: settings.text_repr_version,
        })?),
        Family::ImageText => {
            let projection_path = model_path.with_file_name("projection.onnx");
            Box::new(ImageTextEmbedder::new(ImageTextConfig {
                vision_model_path: model_path,
                projection_model_path: projection_path,
                runtime_library_path: settings.runtime_library_path,
                dimension: settings.dimension,
                embedding_model_id: settings.embedding_model_id,
                text_repr_version: settings.text_repr_version,
            })?)
        }
    };

    Ok(embedder)
}

/// Resolves a `Hub` source to a `Local` one by downloading (and caching)
/// the repository's files, then builds the embedder exactly as `from_local`
/// would. Left as a thin seam: the actual download is out of scope here
/// (non-goal: training/model distribution infrastructure), callers in a
/// networked environment plug in their own resolution of `repo_id` to a
/// cache directory.
pub fn from_hub(
    cached_dir: PathBuf,
    _repo_id: &str,
    _revision: &str,
    settings: EmbedderSettings,
) -> Result<Box<dyn Embedder>, ConfigError> {
    from_local(ModelSource::Local { base_dir: cached_dir }, settings)
}

/// Builds an embedder that calls out to a model served behind HTTP, rather
/// than running inference in-process. Only the dense-text family has a
/// defined remote wire contract today.
pub fn from_cloud(
    endpoint: String,
    auth_token: Option<String>,
    settings: EmbedderSettings,
) -> Result<Box<dyn Embedder>, ConfigError> {
    validate(&settings)?;
    if settings.family != Family::DenseText {
        return Err(ConfigError::IncompleteModelSource {
            family: settings.family,
            reason: "only dense-text embedders have a defined HTTP wire contract".into(),
        });
    }

    Ok(Box::new(OnnxHttpEmbedder::new(OnnxHttpConfig {
        endpoint,
        auth_token,
        dimension: settings.dimension,
        max_input_length: settings.max_input_length,
        embedding_model_id: settings.embedding_model_id,
        text_repr_version: settings.text_repr_version,
    })?))
}

/// Default settings for the local ONNX embedder.
#[derive(Debug, Clone, Copy)]
pub struct OnnxStdIoDefaults {
    pub model_path: &'static str,
    pub tokenizer_path: &'static str,
    pub runtime_dll_path: &'static str,
    pub embedding_dimension: usize,
    pub max_input_tokens: usize,
    pub embedding_model_id: &'static str,
    pub text_repr_version: &'static str,
}

/// Shared defaults so CLI・GUI・tests can stay in sync.
pub const ONNX_STDIO_DEFAULTS: OnnxStdIoDefaults = OnnxStdIoDefaults {
    model_path: "models/ruri-v3-onnx/model.onnx",
    tokenizer_path: "models/ruri-v3-onnx/tokenizer.json",
    runtime_dll_path: "bin/onnxruntime-win-x64-1.23.1/lib/onnxruntime.dll",
    embedding_dimension: 768,
    max_input_tokens: 8192,
    embedding_model_id: "ruri-v3-onnx",
    text_repr_version: "v1",
};

/// Convenience helper to build an [`OnnxStdIoConfig`] from the shared defaults.
pub fn default_stdio_config() -> OnnxStdIoConfig {
    // Resolve asset paths relative to this crate's directory, so it works
    // regardless of the current working directory (workspace root or crate dir).
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    OnnxStdIoConfig {
        model_path: base.join(ONNX_STDIO_DEFAULTS.model_path),
        tokenizer_path: base.join(ONNX_STDIO_DEFAULTS.tokenizer_path),
        runtime_library_path: base.join(ONNX_STDIO_DEFAULTS.runtime_dll_path),
        dimension: ONNX_STDIO_DEFAULTS.embedding_dimension,
        max_input_length: ONNX_STDIO_DEFAULTS.max_input_tokens,
        embedding_model_id: ONNX_STDIO_DEFAULTS.embedding_model_id.into(),
        text_repr_version: ONNX_STDIO_DEFAULTS.text_repr_version.into(),
    }
}
