use std::path::Path;

use embed_model::{RawSegment, SourceMeta};

use crate::error::SourceError;
use crate::reader_txt::populate_timestamps;

/// Decodes an image file into a single `RawSegment::Image`, ready for an
/// image-text or document-page embedder.
pub fn read(path: &Path) -> Result<Vec<RawSegment>, SourceError> {
    let img = image::open(path).map_err(|e| SourceError::ImageDecode(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut source = SourceMeta::for_path(path.display().to_string());
    populate_timestamps(&mut source, path);

    Ok(vec![RawSegment::Image {
        pixels: rgba.into_raw(),
        width,
        height,
        source,
    }])
}
