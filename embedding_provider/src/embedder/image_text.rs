//! Image-text (CLIP/SigLIP-style) embedder: images and text share one
//! vector space. The vision tower runs as a two-stage ONNX graph, a main
//! encoder followed by a projection head, mirroring how these models are
//! usually exported.

use std::path::PathBuf;
use std::sync::Mutex;

use embed_model::{EmbedInput, Vector};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::{Embedder, EmbedderError, EmbedderInfo, Family, ProviderKind};

const IMAGE_SIDE: u32 = 224;
const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];
const CLIP_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

#[derive(Debug, Clone)]
pub struct ImageTextConfig {
    pub vision_model_path: PathBuf,
    pub projection_model_path: PathBuf,
    pub runtime_library_path: PathBuf,
    pub dimension: usize,
    pub embedding_model_id: String,
    pub text_repr_version: String,
}

#[derive(Debug)]
pub struct ImageTextEmbedder {
    info: EmbedderInfo,
    vision_session: Mutex<Session>,
    projection_session: Mutex<Session>,
}

impl ImageTextEmbedder {
    pub fn new(config: ImageTextConfig) -> Result<Self, EmbedderError> {
        if config.dimension == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "dimension must be greater than zero".into(),
            });
        }

        super::ensure_ort_initialized(&config.runtime_library_path)?;

        let vision_session = Session::builder()
            .map_err(|err| super::map_ort_error("create vision session builder", err))?
            .commit_from_file(&config.vision_model_path)
            .map_err(|err| super::map_ort_error("load vision model", err))?;

        let projection_session = Session::builder()
            .map_err(|err| super::map_ort_error("create projection session builder", err))?
            .commit_from_file(&config.projection_model_path)
            .map_err(|err| super::map_ort_error("load projection model", err))?;

        Ok(Self {
            info: EmbedderInfo {
                provider: ProviderKind::OnnxStdIo,
                family: Family::ImageText,
                embedding_model_id: config.embedding_model_id,
                dimension: config.dimension,
                text_repr_version: config.text_repr_version,
            },
            vision_session: Mutex::new(vision_session),
            projection_session: Mutex::new(projection_session),
        })
    }

    /// Resizes (nearest-neighbor) to a fixed square and applies CLIP's
    /// per-channel mean/std normalization, producing an NCHW tensor.
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
                    let raw = pixels[idx + c] as f32 / 255.0;
                    out[(0, c, y as usize, x as usize)] = (raw - CLIP_MEAN[c]) / CLIP_STD[c];
                }
            }
        }
        out
    }

    pub fn embed_image(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<f32>, EmbedderError> {
        let tensor_data = Self::preprocess(pixels, width, height);
        let input = Tensor::from_array(tensor_data)
            .map_err(|err| super::map_ort_error("prepare image tensor", err))?;

        let main_output = {
            let mut session = self.vision_session.lock().unwrap();
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|err| super::map_ort_error("execute vision session", err))?;
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|err| super::map_ort_error("extract vision output", err))?;
            let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
            (dims, data.to_vec())
        };

        let (dims, data) = main_output;
        let feature_dim = *dims.last().unwrap_or(&data.len());
        let features = Array4::from_shape_vec((1, 1, 1, feature_dim), data)
            .map_err(|err| EmbedderError::ProviderFailure {
                message: format!("failed to reshape vision features: {err}"),
            })?;
        let projection_input = Tensor::from_array(features)
            .map_err(|err| super::map_ort_error("prepare projection input", err))?;

        let mut projection_session = self.projection_session.lock().unwrap();
        let outputs = projection_session
            .run(ort::inputs![projection_input])
            .map_err(|err| super::map_ort_error("execute projection session", err))?;

        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| super::map_ort_error("extract projection output", err))?;

        let mut vector = data.to_vec();
        if vector.len() != self.info.dimension {
            return Err(EmbedderError::ProviderFailure {
                message: format!(
                    "projected embedding dimension {} does not match configured dimension {}",
                    vector.len(),
                    self.info.dimension
                ),
            });
        }

        embed_model::l2_normalize(&mut vector);
        Ok(vector)
    }
}

impl Embedder for ImageTextEmbedder {
    fn embed_batch(&self, inputs: &[EmbedInput]) -> Result<Vec<Vector>, EmbedderError> {
        inputs
            .iter()
            .map(|input| match input {
                EmbedInput::Image(image) => self
                    .embed_image(&image.pixels, image.width, image.height)
                    .map(Vector::Dense),
                EmbedInput::Chunk(_) => Err(EmbedderError::UnsupportedInput {
                    family: Family::ImageText,
                }),
            })
            .collect()
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}
