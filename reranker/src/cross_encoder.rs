use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use ndarray::Array2;
use ort::{session::Session, Error as OrtError, value::Tensor};
use tokenizers::{Encoding, Tokenizer};

use crate::error::RerankerError;
use crate::template::PromptTemplate;

/// How the classification head's output logits are turned into a score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringHead {
    /// A single positive-class logit; score is `sigmoid(logit)`.
    Sigmoid,
    /// Two logits (negative, positive); score is `softmax(logits)[1]`.
    Softmax,
}

/// Configuration for a cross-encoder reranker backed by an ONNX model.
#[derive(Debug, Clone)]
pub struct CrossEncoderConfig {
    pub model_path: PathBuf,
    pub runtime_library_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub template: PromptTemplate,
    pub scoring_head: ScoringHead,
    pub max_input_length: usize,
    pub model_id: String,
}

/// Cross-encoder reranker: scores (query, document) pairs with a classification head.
#[derive(Debug)]
pub struct CrossEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    template: PromptTemplate,
    scoring_head: ScoringHead,
    max_input_length: usize,
    model_id: String,
}

static ORT_RUNTIME_PATH: OnceLock<PathBuf> = OnceLock::new();

impl CrossEncoder {
    pub fn new(config: CrossEncoderConfig) -> Result<Self, RerankerError> {
        if config.max_input_length == 0 {
            return Err(RerankerError::InvalidConfiguration {
                message: "max_input_length must be greater than zero".into(),
            });
        }

        let runtime_library_path =
            resolve_existing_path(&config.runtime_library_path, "ONNX Runtime shared library")?;
        ensure_ort_initialized(&runtime_library_path)?;

        let model_path = resolve_existing_path(&config.model_path, "reranker ONNX model")?;
        let tokenizer_path = resolve_existing_path(&config.tokenizer_path, "tokenizer config")?;

        let session = Session::builder()
            .map_err(|err| map_ort_error("create session builder", err))?
            .commit_from_file(&model_path)
            .map_err(|err| map_ort_error("load reranker ONNX model", err))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|err| RerankerError::ProviderFailure {
            message: format!("load tokenizer failed: {err}"),
        })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            template: config.template,
            scoring_head: config.scoring_head,
            max_input_length: config.max_input_length,
            model_id: config.model_id,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Scores every `(query, document)` pair in `pairs`, batching `batch_size`
    /// pairs per inference call. Returns one score per input pair, in order.
    pub fn score_pairs(&self, pairs: &[(&str, &str)], batch_size: usize) -> Result<Vec<f32>, RerankerError> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        if batch_size == 0 {
            return Err(RerankerError::InvalidConfiguration {
                message: "batch_size must be greater than zero".into(),
            });
        }

        let mut scores = Vec::with_capacity(pairs.len());
        for chunk in pairs.chunks(batch_size) {
            scores.extend(self.score_batch(chunk)?);
        }
        Ok(scores)
    }

    fn score_batch(&self, pairs: &[(&str, &str)]) -> Result<Vec<f32>, RerankerError> {
        let encodings = pairs
            .iter()
            .map(|(query, document)| self.template.encode(&self.tokenizer, query, document))
            .collect::<Result<Vec<_>, _>>()?;

        let max_len = encodings.iter().map(Encoding::len).max().unwrap_or(0);
        if max_len > self.max_input_length {
            return Err(RerankerError::InputTooLong {
                max_length: self.max_input_length,
                actual_length: max_len,
            });
        }

        let (input_ids, attention_mask) = self.build_input_tensors(&encodings)?;
        let logits = self.run_session(input_ids, attention_mask)?;

        logits
            .into_iter()
            .map(|row| self.apply_scoring_head(&row))
            .collect()
    }

    fn build_input_tensors(&self, encodings: &[Encoding]) -> Result<(Tensor<i64>, Tensor<i64>), RerankerError> {
        let batch = encodings.len();
        let seq_len = encodings.iter().map(Encoding::len).max().unwrap_or(0);

        let mut input_ids = Array2::<i64>::zeros((batch, seq_len));
        let mut attention_mask = Array2::<i64>::zeros((batch, seq_len));

        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            for (col, (&id, &m)) in ids.iter().zip(mask.iter()).enumerate() {
                input_ids[(row, col)] = id as i64;
                attention_mask[(row, col)] = m as i64;
            }
        }

        let input_ids = Tensor::from_array(input_ids).map_err(|err| map_ort_error("prepare input_ids", err))?;
        let attention_mask =
            Tensor::from_array(attention_mask).map_err(|err| map_ort_error("prepare attention_mask", err))?;
        Ok((input_ids, attention_mask))
    }

    fn run_session(&self, input_ids: Tensor<i64>, attention_mask: Tensor<i64>) -> Result<Vec<Vec<f32>>, RerankerError> {
        let mut session = self.session.lock().unwrap();
        let outputs = session
            .run(ort::inputs![input_ids, attention_mask])
            .map_err(|err| map_ort_error("execute reranker ONNX session", err))?;

        let output = &outputs[0];
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|err| map_ort_error("extract classification logits", err))?;

        if shape.len() != 2 {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return Err(RerankerError::ProviderFailure {
                message: format!("reranker output must be rank-2 [batch, num_labels], got shape {:?}", dims),
            });
        }

        let batch: usize = shape[0].try_into().unwrap();
        let num_labels: usize = shape[1].try_into().unwrap();

        let expected_labels = match self.scoring_head {
            ScoringHead::Sigmoid => 1,
            ScoringHead::Softmax => 2,
        };
        if num_labels != expected_labels {
            return Err(RerankerError::ProviderFailure {
                message: format!(
                    "reranker head expects {expected_labels} logit(s) per pair, model produced {num_labels}"
                ),
            });
        }

        Ok(data.chunks(num_labels).map(|row| row.to_vec()).take(batch).collect())
    }

    fn apply_scoring_head(&self, logits: &[f32]) -> Result<f32, RerankerError> {
        match self.scoring_head {
            ScoringHead::Sigmoid => {
                let logit = logits.first().copied().ok_or_else(|| RerankerError::ProviderFailure {
                    message: "sigmoid head received no logits".into(),
                })?;
                Ok(sigmoid(logit))
            }
            ScoringHead::Softmax => {
                if logits.len() != 2 {
                    return Err(RerankerError::ProviderFailure {
                        message: format!("softmax head expects 2 logits, got {}", logits.len()),
                    });
                }
                Ok(softmax2(logits[0], logits[1]))
            }
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax2(negative: f32, positive: f32) -> f32 {
    let max = negative.max(positive);
    let exp_neg = (negative - max).exp();
    let exp_pos = (positive - max).exp();
    exp_pos / (exp_neg + exp_pos)
}

fn ensure_ort_initialized(runtime_library_path: &Path) -> Result<(), RerankerError> {
    if let Some(existing) = ORT_RUNTIME_PATH.get() {
        if !paths_equal(existing, runtime_library_path) {
            return Err(RerankerError::InvalidConfiguration {
                message: format!(
                    "ONNX Runtime already initialized with library `{}`; cannot reinitialize with `{}`",
                    existing.display(),
                    runtime_library_path.display()
                ),
            });
        }
    } else {
        let _ = ORT_RUNTIME_PATH.set(runtime_library_path.to_path_buf());
    }

    ort::init_from(runtime_library_path.to_string_lossy().to_string())
        .with_name("reranker")
        .commit()
        .map_err(|err| map_ort_error("initialize ONNX Runtime environment", err))?;

    Ok(())
}

fn resolve_existing_path(path: &Path, description: &str) -> Result<PathBuf, RerankerError> {
    fs::metadata(path).map_err(|_| RerankerError::InvalidConfiguration {
        message: format!("{description} `{}` does not exist", path.display()),
    })?;

    path.canonicalize().map_err(|err| RerankerError::ProviderFailure {
        message: format!("failed to canonicalize {description} `{}`: {err}", path.display()),
    })
}

fn map_ort_error(context: &str, err: OrtError) -> RerankerError {
    RerankerError::ProviderFailure {
        message: format!("{context} failed: {err}"),
    }
}

fn paths_equal(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (fs::canonicalize(a), fs::canonicalize(b)) {
        a == b
    } else {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_monotonic_and_bounded() {
        assert!(sigmoid(0.0) - 0.5 < 1e-6);
        assert!(sigmoid(10.0) > sigmoid(0.0));
        assert!(sigmoid(10.0) < 1.0);
        assert!(sigmoid(-10.0) > 0.0);
    }

    #[test]
    fn softmax2_favors_the_larger_logit() {
        let score = softmax2(0.0, 5.0);
        assert!(score > 0.9);
        let score = softmax2(5.0, 0.0);
        assert!(score < 0.1);
    }
}
