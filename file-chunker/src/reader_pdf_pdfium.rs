#![cfg(feature = "pdfium")]

use pdfium_render::prelude::*;

use crate::error::SourceError;

const OCR_DPI: f32 = 150.0;

fn library() -> Result<Pdfium, SourceError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| SourceError::Pdf {
            path: String::new(),
            reason: format!("failed to bind pdfium library: {e}"),
        })
}

/// Extracts plain text per page, in page order, starting at page 1.
pub fn read_pages(path: &str) -> Result<Vec<(u32, String)>, SourceError> {
    let pdfium = library()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| SourceError::Pdf {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    let mut out = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map(|t| normalize_page_text(&t.all()))
            .unwrap_or_default();
        out.push((idx as u32 + 1, text));
    }
    Ok(out)
}

/// Rasterizes one page to RGBA pixels at at least `OCR_DPI`, for the OCR
/// fallback path.
pub fn rasterize_page(path: &str, page_number: u32) -> Result<(Vec<u8>, u32, u32), SourceError> {
    let pdfium = library()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| SourceError::Pdf {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    let page = document
        .pages()
        .get(page_number.saturating_sub(1))
        .map_err(|e| SourceError::Pdf {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    let scale = OCR_DPI / 72.0;
    let width = (page.width().value * scale).round() as i32;
    let height = (page.height().value * scale).round() as i32;

    let config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height);
    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| SourceError::Pdf {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    let image = bitmap.as_image().to_rgba8();
    let (w, h) = image.dimensions();
    Ok((image.into_raw(), w, h))
}

/// Joins hyphenated line wraps and collapses the running-header/footer
/// noise pdfium otherwise leaves in as separate lines.
fn normalize_page_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let lines: Vec<&str> = raw.lines().filter(|l| !is_noise_line(l)).collect();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_end();
        if let Some(stripped) = trimmed.strip_suffix('-') {
            if i + 1 < lines.len() && first_char_is_lowercase(lines[i + 1]) {
                out.push_str(stripped);
                continue;
            }
        }
        out.push_str(trimmed);
        out.push('\n');
    }
    out.trim().to_string()
}

fn first_char_is_lowercase(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .map(|c| c.is_lowercase())
        .unwrap_or(false)
}

/// A running page-number line ("3", "Page 3 of 10", "- 3 -") carries no
/// content and would otherwise get merged into neighboring body text.
fn is_noise_line(line: &str) -> bool {
    let t = line.trim();
    if t.is_empty() {
        return true;
    }
    if t.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    let stripped = t.trim_matches(|c: char| c == '-' || c.is_whitespace());
    if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    false
}
