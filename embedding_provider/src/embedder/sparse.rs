//! Splade-style sparse text embedder: a vocabulary-indexed weight map
//! instead of a fixed-length dense vector, produced by max-pooling
//! `log(1 + relu(logit))` over the sequence dimension for each vocabulary
//! entry and keeping only the nonzero entries.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use embed_model::{EmbedInput, Vector};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{Embedder, EmbedderError, EmbedderInfo, Family, ProviderKind};

#[derive(Debug, Clone)]
pub struct SpladeConfig {
    pub model_path: PathBuf,
    pub runtime_library_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub vocab_size: usize,
    pub max_input_length: usize,
    pub embedding_model_id: String,
    pub text_repr_version: String,
}

#[derive(Debug)]
pub struct SpladeEmbedder {
    info: EmbedderInfo,
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    max_input_length: usize,
}

impl SpladeEmbedder {
    pub fn new(config: SpladeConfig) -> Result<Self, EmbedderError> {
        if config.vocab_size == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "vocab_size must be greater than zero".into(),
            });
        }

        super::ensure_ort_initialized(&config.runtime_library_path)?;

        let session = Session::builder()
            .map_err(|err| super::map_ort_error("create session builder", err))?
            .commit_from_file(&config.model_path)
            .map_err(|err| super::map_ort_error("load ONNX model", err))?;

        let tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|err| super::map_tokenizer_error("load tokenizer", err))?;

        Ok(Self {
            info: EmbedderInfo {
                provider: ProviderKind::OnnxStdIo,
                family: Family::SparseText,
                embedding_model_id: config.embedding_model_id,
                dimension: config.vocab_size,
                text_repr_version: config.text_repr_version,
            },
            session: Mutex::new(session),
            tokenizer,
            max_input_length: config.max_input_length,
        })
    }

    pub fn embed_text(&self, text: &str) -> Result<BTreeMap<u32, f32>, EmbedderError> {
        Ok(self.embed_batch_text(&[text])?.into_iter().next().unwrap_or_default())
    }

    /// Tokenizes and runs the whole slice as one padded batch, so
    /// `batch_size` actually bounds the number of `session.run()` calls.
    pub fn embed_batch_text(&self, texts: &[&str]) -> Result<Vec<BTreeMap<u32, f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = texts
            .iter()
            .map(|t| self.tokenizer.encode(*t, true))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| super::map_tokenizer_error("tokenize inputs", err))?;

        let seq_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        if seq_len > self.max_input_length {
            return Err(EmbedderError::InputTooLong {
                max_length: self.max_input_length,
                actual_length: seq_len,
            });
        }

        let batch = encodings.len();
        let mut input_ids = Array2::<i64>::zeros((batch, seq_len));
        let mut attention_mask = Array2::<i64>::zeros((batch, seq_len));
        for (row, encoding) in encodings.iter().enumerate() {
            for (col, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[(row, col)] = id as i64;
                attention_mask[(row, col)] = 1;
            }
        }

        let input_ids =
            Tensor::from_array(input_ids).map_err(|err| super::map_ort_error("prepare input_ids", err))?;
        let attention_mask = Tensor::from_array(attention_mask)
            .map_err(|err| super::map_ort_error("prepare attention_mask", err))?;

        let mut session = self.session.lock().unwrap();
        let outputs = session
            .run(ort::inputs![input_ids, attention_mask])
            .map_err(|err| super::map_ort_error("execute ONNX session", err))?;

        let output = &outputs[0];
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|err| super::map_ort_error("extract output tensor", err))?;

        if shape.len() != 3 {
            return Err(EmbedderError::ProviderFailure {
                message: "splade logits must be rank-3 [batch, seq_len, vocab]".into(),
            });
        }

        let returned_batch: usize = shape[0].try_into().unwrap();
        let returned_seq_len: usize = shape[1].try_into().unwrap();
        let vocab: usize = shape[2].try_into().unwrap();

        if returned_batch != batch {
            return Err(EmbedderError::ProviderFailure {
                message: format!("model returned batch size {returned_batch}, expected {batch}"),
            });
        }

        let mut results = Vec::with_capacity(batch);
        for b in 0..batch {
            let mut pooled = vec![0f32; vocab];
            for t in 0..returned_seq_len {
                let base = (b * returned_seq_len + t) * vocab;
                for v in 0..vocab {
                    let logit = data[base + v];
                    let activated = (logit.max(0.0) + 1.0).ln();
                    if activated > pooled[v] {
                        pooled[v] = activated;
                    }
                }
            }

            let mut weights = BTreeMap::new();
            for (index, weight) in pooled.into_iter().enumerate() {
                if weight > 0.0 {
                    weights.insert(index as u32, weight);
                }
            }
            results.push(weights);
        }
        Ok(results)
    }
}

impl Embedder for SpladeEmbedder {
    fn embed_batch(&self, inputs: &[EmbedInput]) -> Result<Vec<Vector>, EmbedderError> {
        let texts: Vec<&str> = inputs
            .iter()
            .map(|input| match input {
                EmbedInput::Chunk(chunk) => Ok(chunk.text.as_str()),
                EmbedInput::Image(_) => Err(EmbedderError::UnsupportedInput {
                    family: Family::SparseText,
                }),
            })
            .collect::<Result<_, _>>()?;

        Ok(self
            .embed_batch_text(&texts)?
            .into_iter()
            .map(Vector::Sparse)
            .collect())
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splade_activation_keeps_only_positive_weights() {
        let activated_positive = (2.0_f32.max(0.0) + 1.0).ln();
        let activated_negative = ((-2.0_f32).max(0.0) + 1.0).ln();
        assert!(activated_positive > 0.0);
        assert_eq!(activated_negative, 0.0);
    }
}
