//! Document-page (ColPali-style) embedder: a whole rendered page is
//! embedded as one vector per image patch, so retrieval can run the same
//! late-interaction MaxSim scoring used for ColBERT text, without any OCR
//! or layout extraction step.

use std::path::PathBuf;
use std::sync::Mutex;

use embed_model::{EmbedInput, Vector};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::{Embedder, EmbedderError, EmbedderInfo, Family, ProviderKind};

const IMAGE_SIDE: u32 = 448;

#[derive(Debug, Clone)]
pub struct ColpaliConfig {
    pub model_path: PathBuf,
    pub runtime_library_path: PathBuf,
    pub dimension: usize,
    pub embedding_model_id: String,
    pub text_repr_version: String,
}

#[derive(Debug)]
pub struct ColpaliEmbedder {
    info: EmbedderInfo,
    session: Mutex<Session>,
}

impl ColpaliEmbedder {
    pub fn new(config: ColpaliConfig) -> Result<Self, EmbedderError> {
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

        Ok(Self {
            info: EmbedderInfo {
                provider: ProviderKind::OnnxStdIo,
                family: Family::DocumentPageImage,
                embedding_model_id: config.embedding_model_id,
                dimension: config.dimension,
                text_repr_version: config.text_repr_version,
            },
            session: Mutex::new(session),
        })
    }

    fn preprocess(pixels: &[u8], width: u32, height: u32) -> Array4<f32> {
        let mut out = Array4::<f32>::zeros((1, 3, IMAGE_SIDE as usize, IMAGE_SIDE as usize));
        for y in 0..IMAGE_SIDE {
            for x in 0..IMAGE_SIDE {
                let src_x = (x * width) / IMAGE_SIDE;
                let src_y = (y * height) / IMAGE_SIDE;
                let idx = ((src_y * width + src_x) * 4) as usize;
                if idx + 3 >= pixels.len() {
                    continue;
                }
                for c in 0..3 {
                    out[(0, c, y as usize, x as usize)] = pixels[idx + c] as f32 / 255.0;
                }
            }
        }
        out
    }

    pub fn embed_page_image(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let tensor_data = Self::preprocess(pixels, width, height);
        let input = Tensor::from_array(tensor_data)
            .map_err(|err| super::map_ort_error("prepare page tensor", err))?;

        let mut session = self.session.lock().unwrap();
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|err| super::map_ort_error("execute ONNX session", err))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| super::map_ort_error("extract patch embeddings", err))?;

        if shape.len() != 3 {
            return Err(EmbedderError::ProviderFailure {
                message: "page embeddings must be rank-3 [batch, patches, hidden]".into(),
            });
        }

        let num_patches: usize = shape[1].try_into().unwrap();
        let hidden: usize = shape[2].try_into().unwrap();

        if hidden != self.info.dimension {
            return Err(EmbedderError::ProviderFailure {
                message: format!(
                    "patch embedding dimension {hidden} does not match configured dimension {}",
                    self.info.dimension
                ),
            });
        }

        let mut rows = Vec::with_capacity(num_patches);
        for p in 0..num_patches {
            let base = p * hidden;
            let mut row = data[base..base + hidden].to_vec();
            embed_model::l2_normalize(&mut row);
            rows.push(row);
        }
        Ok(rows)
    }
}

impl Embedder for ColpaliEmbedder {
    fn embed_batch(&self, inputs: &[EmbedInput]) -> Result<Vec<Vector>, EmbedderError> {
        inputs
            .iter()
            .map(|input| match input {
                EmbedInput::Image(image) => self
                    .embed_page_image(&image.pixels, image.width, image.height)
                    .map(Vector::MultiVector),
                EmbedInput::Chunk(_) => Err(EmbedderError::UnsupportedInput {
                    family: Family::DocumentPageImage,
                }),
            })
            .collect()
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}
