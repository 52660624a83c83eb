//! Late-interaction (ColBERT-style) text embedder: one L2-normalized vector
//! per token instead of a single pooled vector, so retrieval can compute
//! MaxSim scores against query tokens downstream.

use std::path::PathBuf;
use std::sync::Mutex;

use embed_model::{EmbedInput, Vector};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{Embedder, EmbedderError, EmbedderInfo, Family, ProviderKind};

#[derive(Debug, Clone)]
pub struct ColbertConfig {
    pub model_path: PathBuf,
    pub runtime_library_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub dimension: usize,
    pub max_input_length: usize,
    pub embedding_model_id: String,
    pub text_repr_version: String,
}

#[derive(Debug)]
pub struct ColbertEmbedder {
    info: EmbedderInfo,
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    max_input_length: usize,
}

impl ColbertEmbedder {
    pub fn new(config: ColbertConfig) -> Result<Self, EmbedderError> {
        if config.dimension == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "dimension must be greater than zero".into(),
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
                family: Family::LateInteractionText,
                embedding_model_id: config.embedding_model_id,
                dimension: config.dimension,
                text_repr_version: config.text_repr_version,
            },
            session: Mutex::new(session),
            tokenizer,
            max_input_length: config.max_input_length,
        })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<Vec<f32>>, EmbedderError> {
        Ok(self.embed_batch_text(&[text])?.into_iter().next().unwrap_or_default())
    }

    /// Tokenizes and runs the whole slice as one padded batch, so
    /// `batch_size` actually bounds the number of `session.run()` calls.
    /// Each sequence's rows are truncated back to its own (unpadded) token
    /// count before returning.
    pub fn embed_batch_text(&self, texts: &[&str]) -> Result<Vec<Vec<Vec<f32>>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = texts
            .iter()
            .map(|t| self.tokenizer.encode(*t, true))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| super::map_tokenizer_error("tokenize inputs", err))?;

        let lengths: Vec<usize> = encodings.iter().map(|e| e.get_ids().len()).collect();
        let padded_seq_len = lengths.iter().copied().max().unwrap_or(0);
        if padded_seq_len > self.max_input_length {
            return Err(EmbedderError::InputTooLong {
                max_length: self.max_input_length,
                actual_length: padded_seq_len,
            });
        }

        let batch = encodings.len();
        let mut input_ids = Array2::<i64>::zeros((batch, padded_seq_len));
        let mut attention_mask = Array2::<i64>::zeros((batch, padded_seq_len));
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
                message: "token embeddings must be rank-3 [batch, seq_len, hidden]".into(),
            });
        }

        let returned_batch: usize = shape[0].try_into().unwrap();
        let returned_seq_len: usize = shape[1].try_into().unwrap();
        let hidden: usize = shape[2].try_into().unwrap();

        if returned_batch != batch {
            return Err(EmbedderError::ProviderFailure {
                message: format!("model returned batch size {returned_batch}, expected {batch}"),
            });
        }

        if hidden != self.info.dimension {
            return Err(EmbedderError::ProviderFailure {
                message: format!(
                    "token embedding dimension {hidden} does not match configured dimension {}",
                    self.info.dimension
                ),
            });
        }

        let mut results = Vec::with_capacity(batch);
        for b in 0..batch {
            let seq_len = lengths[b].min(returned_seq_len);
            let mut rows = Vec::with_capacity(seq_len);
            for t in 0..seq_len {
                let base = (b * returned_seq_len + t) * hidden;
                let mut row = data[base..base + hidden].to_vec();
                embed_model::l2_normalize(&mut row);
                rows.push(row);
            }
            results.push(rows);
        }
        Ok(results)
    }
}

impl Embedder for ColbertEmbedder {
    fn embed_batch(&self, inputs: &[EmbedInput]) -> Result<Vec<Vector>, EmbedderError> {
        let texts: Vec<&str> = inputs
            .iter()
            .map(|input| match input {
                EmbedInput::Chunk(chunk) => Ok(chunk.text.as_str()),
                EmbedInput::Image(_) => Err(EmbedderError::UnsupportedInput {
                    family: Family::LateInteractionText,
                }),
            })
            .collect::<Result<_, _>>()?;

        Ok(self
            .embed_batch_text(&texts)?
            .into_iter()
            .map(Vector::MultiVector)
            .collect())
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}
