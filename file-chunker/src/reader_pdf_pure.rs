#![cfg(feature = "pure-pdf")]

use lopdf::Document;

use crate::error::SourceError;

/// Extracts plain text per page using `lopdf`'s content-stream decoder.
/// No rasterization path exists for this backend; callers that need the
/// OCR fallback must use the `pdfium` feature instead.
pub fn read_pages(path: &str) -> Result<Vec<(u32, String)>, SourceError> {
    let doc = Document::load(path).map_err(|e| SourceError::Pdf {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    let mut pages: Vec<(u32, u32)> = doc.get_pages().into_keys().map(|p| (p, p)).collect();
    pages.sort_by_key(|(p, _)| *p);

    let mut out = Vec::new();
    for (page_number, _) in pages {
        let text = doc.extract_text(&[page_number]).unwrap_or_default();
        out.push((page_number, text));
    }
    Ok(out)
}
