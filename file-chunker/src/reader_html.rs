use std::path::Path;

use embed_model::{RawSegment, SourceMeta};
use scraper::{Html, Selector};

use crate::error::SourceError;
use crate::reader_txt::populate_timestamps;

const BOILERPLATE_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "noscript"];

/// Reads a local HTML file, stripping script/style/nav/header/footer
/// boilerplate and collapsing the remaining text into one segment.
pub fn read(path: &Path) -> Result<Vec<RawSegment>, SourceError> {
    let bytes = std::fs::read(path).map_err(|e| SourceError::io(path.display().to_string(), e))?;
    let html = String::from_utf8_lossy(&bytes);
    let content = extract_main_text(&html);

    let mut source = SourceMeta::for_path(path.display().to_string());
    populate_timestamps(&mut source, path);

    Ok(vec![RawSegment::Text {
        content,
        source,
        char_offset: 0,
    }])
}

/// Reads an already-fetched HTML document (e.g. from `embed_webpage`),
/// attributing `url` as the source path.
pub fn read_str(html: &str, url: &str) -> Vec<RawSegment> {
    let content = extract_main_text(html);
    let source = SourceMeta::for_path(url);
    vec![RawSegment::Text {
        content,
        source,
        char_offset: 0,
    }]
}

fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").unwrap();

    let mut text = String::new();
    if let Some(body) = document.select(&body_selector).next() {
        collect_text(body, &mut text);
    } else {
        collect_text(document.root_element(), &mut text);
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(el: scraper::ElementRef, out: &mut String) {
    if BOILERPLATE_TAGS.contains(&el.value().name()) {
        return;
    }
    for child in el.children() {
        if let Some(child_el) = scraper::ElementRef::wrap(child) {
            collect_text(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_and_nav_text() {
        let html = "<html><body><nav>menu</nav><script>var x=1;</script><p>Real content here.</p></body></html>";
        let segments = read_str(html, "https://example.com/page");
        match &segments[0] {
            RawSegment::Text { content, .. } => {
                assert!(content.contains("Real content"));
                assert!(!content.contains("var x"));
            }
            _ => panic!("expected text segment"),
        }
    }
}
