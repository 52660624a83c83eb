use thiserror::Error;

/// Errors a source reader or chunker can raise. Mirrors the reader
/// error taxonomy.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),
    #[error("pdf extraction failed for {path}: {reason}")]
    Pdf { path: String, reason: String },
    #[error("ocr collaborator failed: {0}")]
    Ocr(String),
    #[error("audio transcription failed: {0}")]
    Transcription(String),
    #[error("image decode failed: {0}")]
    ImageDecode(String),
    #[error("video decode failed: {0}")]
    VideoDecode(String),
    #[error("remote fetch failed for {uri}: {reason}")]
    Remote { uri: String, reason: String },
}

impl SourceError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }
}
