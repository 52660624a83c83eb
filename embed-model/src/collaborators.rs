//! Traits for the external systems the pipeline calls out to but does not
//! implement itself: OCR, speech-to-text, and the dense encoder used by
//! semantic chunking. Engine internals are out of scope here; these are the
//! seams a caller plugs a real engine into.

/// Recognizes text in a rasterized page or image. Implementations wrap
/// whatever OCR engine the deployment has available.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, rgba_pixels: &[u8], width: u32, height: u32) -> Result<String, String>;
}

/// Transcribes a window of PCM audio to text. Called synchronously by the
/// audio reader; any async engine is expected to block internally rather
/// than leak its concurrency model into this trait.
pub trait AudioTranscriber: Send + Sync {
    fn transcribe(&self, pcm: &[f32], sample_rate: u32) -> Result<String, String>;
}

/// A dense text encoder, used by the semantic chunking strategy to measure
/// pairwise sentence similarity. Implemented by `embedding_provider`'s
/// dense-text embedders; kept here so `file-chunker` does not need to depend
/// on `embedding_provider` to offer the semantic strategy.
pub trait DenseEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Vec<f32>;
}
