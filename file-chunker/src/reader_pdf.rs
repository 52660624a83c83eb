use std::path::Path;

use embed_model::collaborators::OcrEngine;
use embed_model::{RawSegment, SourceMeta};

use crate::error::SourceError;
use crate::reader_txt::populate_timestamps;

#[derive(Debug, Clone, Copy)]
pub enum PdfBackend {
    Pdfium,
    PureRust,
}

pub fn default_backend() -> PdfBackend {
    if cfg!(feature = "pdfium") {
        PdfBackend::Pdfium
    } else {
        PdfBackend::PureRust
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReadConfig {
    /// Force OCR even when a page has extractable text.
    pub use_ocr: bool,
}

/// Extracts text per page, one `RawSegment::Text` per page. Falls back to
/// OCR when `config.use_ocr` is set or a page's
/// extracted text is empty; the page is rasterized at >=150 DPI before
/// being handed to the OCR collaborator.
pub fn read(
    path: &Path,
    config: &PdfReadConfig,
    ocr: Option<&dyn OcrEngine>,
) -> Result<Vec<RawSegment>, SourceError> {
    let path_str = path.display().to_string();
    let pages = match default_backend() {
        PdfBackend::Pdfium => {
            #[cfg(feature = "pdfium")]
            {
                crate::reader_pdf_pdfium::read_pages(&path_str)?
            }
            #[cfg(not(feature = "pdfium"))]
            {
                return Err(SourceError::Pdf {
                    path: path_str,
                    reason: "pdfium feature not enabled".into(),
                });
            }
        }
        PdfBackend::PureRust => {
            #[cfg(feature = "pure-pdf")]
            {
                crate::reader_pdf_pure::read_pages(&path_str)?
            }
            #[cfg(not(feature = "pure-pdf"))]
            {
                return Err(SourceError::Pdf {
                    path: path_str,
                    reason: "no pdf backend feature enabled".into(),
                });
            }
        }
    };

    let mut out = Vec::with_capacity(pages.len());
    for (page_number, mut text) in pages {
        if config.use_ocr || text.trim().is_empty() {
            text = run_ocr_fallback(&path_str, page_number, ocr)?;
        }

        let mut source = SourceMeta::for_path(path_str.clone());
        source.page_number = Some(page_number);
        populate_timestamps(&mut source, path);

        out.push(RawSegment::Text {
            content: text,
            source,
            char_offset: 0,
        });
    }
    Ok(out)
}

fn run_ocr_fallback(
    path: &str,
    page_number: u32,
    ocr: Option<&dyn OcrEngine>,
) -> Result<String, SourceError> {
    let ocr = ocr.ok_or_else(|| SourceError::Ocr("no OCR collaborator configured".into()))?;

    #[cfg(feature = "pdfium")]
    {
        let (pixels, width, height) = crate::reader_pdf_pdfium::rasterize_page(path, page_number)?;
        return ocr
            .recognize(&pixels, width, height)
            .map_err(SourceError::Ocr);
    }

    #[cfg(not(feature = "pdfium"))]
    {
        let _ = (path, page_number, ocr);
        Err(SourceError::Ocr(
            "OCR fallback requires the pdfium feature for rasterization".into(),
        ))
    }
}
