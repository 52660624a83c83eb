//! C1 Source Readers + C2 Chunker.
//!
//! [`read_source`] dispatches on file extension to the right reader, each
//! producing `embed_model::RawSegment`s. [`text_segmenter::chunk_text`] then
//! turns a text segment into size-bounded `Chunk`s. Images and video frames
//! bypass chunking entirely; audio is transcribed to text first and chunked
//! like any other document.

pub mod chunker_rules;
pub mod error;
pub mod reader_audio;
pub mod reader_html;
pub mod reader_image;
pub mod reader_pdf;
#[cfg(feature = "pdfium")]
pub mod reader_pdf_pdfium;
#[cfg(feature = "pure-pdf")]
pub mod reader_pdf_pure;
pub mod reader_remote;
pub mod reader_txt;
pub mod reader_video;
pub mod semantic_chunker;
pub mod text_segmenter;
pub mod unified_blocks;

use std::path::Path;

use embed_model::collaborators::{AudioTranscriber, OcrEngine};
use embed_model::RawSegment;

use error::SourceError;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff"];
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];

#[derive(Default)]
pub struct ReadConfig<'a> {
    pub pdf: reader_pdf::PdfReadConfig,
    pub video: reader_video::VideoReadConfig,
    pub audio: reader_audio::AudioReadConfig,
    pub ocr: Option<&'a dyn OcrEngine>,
    pub transcriber: Option<&'a dyn AudioTranscriber>,
}

/// Reads a local file by dispatching on its extension. Markdown, code, and
/// any extension this module does not recognize fall back to the plain-text
/// reader, which treats the whole file as one segment.
pub fn read_source(path: &Path, config: &ReadConfig<'_>) -> Result<Vec<RawSegment>, SourceError> {
    match extension(path).as_deref() {
        Some("pdf") => reader_pdf::read(path, &config.pdf, config.ocr),
        Some("html") | Some("htm") => reader_html::read(path),
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => reader_image::read(path),
        Some(ext) if AUDIO_EXTENSIONS.contains(&ext) => {
            let transcriber = config.transcriber.ok_or_else(|| {
                SourceError::Transcription("no AudioTranscriber collaborator configured".into())
            })?;
            reader_audio::read(path, &config.audio, transcriber)
        }
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => reader_video::read(path, &config.video),
        _ => reader_txt::read(path),
    }
}

/// Downloads and reads a remote object (currently: any `http(s)://` URL),
/// delegating to [`read_source`] once the content lands on local disk.
pub fn read_remote(url: &str, config: &ReadConfig<'_>) -> Result<Vec<RawSegment>, SourceError> {
    reader_remote::read(url, config)
}

/// Enumerates readable files under `dir`, skipping (and logging) extensions
/// this crate has no reader for. Non-recursive unless `recursive` is set.
pub fn enumerate_directory(dir: &Path, recursive: bool) -> Result<Vec<std::path::PathBuf>, SourceError> {
    let mut out = Vec::new();
    visit(dir, recursive, &mut out)?;
    out.sort();
    Ok(out)
}

fn visit(dir: &Path, recursive: bool, out: &mut Vec<std::path::PathBuf>) -> Result<(), SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SourceError::io(dir.display().to_string(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::io(dir.display().to_string(), e))?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                visit(&path, recursive, out)?;
            }
        } else if is_known_extension(&path) {
            out.push(path);
        } else {
            tracing::warn!(
                path = %path.display(),
                "skipping directory entry: {}",
                SourceError::UnsupportedExtension(path.display().to_string())
            );
        }
    }
    Ok(())
}

/// The extensions this crate has a reader for: PDF, HTML, the known
/// image/audio/video families, and plain text (anything with no extension
/// recognized above is treated as unsupported, not as plain text).
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "rst", "log", "csv", "json", "yaml", "yml"];

fn is_known_extension(path: &Path) -> bool {
    match extension(path).as_deref() {
        Some("pdf") | Some("html") | Some("htm") => true,
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => true,
        Some(ext) if AUDIO_EXTENSIONS.contains(&ext) => true,
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => true,
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => true,
        None => true, // extension-less files (READMEs, etc.) fall back to plain text
        Some(_) => false,
    }
}

/// Lowercased file extension, if any.
pub fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Whether `path`'s extension is one the image reader handles.
pub fn is_image_path(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some(ext) if IMAGE_EXTENSIONS.contains(&ext))
}

/// Whether `path`'s extension is one the audio reader handles.
pub fn is_audio_path(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some(ext) if AUDIO_EXTENSIONS.contains(&ext))
}

/// Whether `path`'s extension is one the video reader handles.
pub fn is_video_path(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some(ext) if VIDEO_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn enumerate_directory_is_non_recursive_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("top.txt"), "top").unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("deep.txt"), "deep").unwrap();

        let shallow = enumerate_directory(dir.path(), false).unwrap();
        assert_eq!(shallow.len(), 1);

        let deep = enumerate_directory(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn enumerate_directory_skips_unsupported_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "ok").unwrap();
        fs::write(dir.path().join("skip.xyz"), "unknown").unwrap();

        let sources = enumerate_directory(dir.path(), false).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].file_name().unwrap(), "keep.txt");
    }
}
