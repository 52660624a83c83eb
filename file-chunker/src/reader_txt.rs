use std::fs;
use std::path::Path;

use embed_model::{RawSegment, SourceMeta};

use crate::error::SourceError;

/// Reads a plain-text, markdown, or source-code file as a single segment.
/// The whole file becomes one `RawSegment::Text`; sentence/word/semantic
/// splitting is the chunker's job, not the reader's.
pub fn read(path: &Path) -> Result<Vec<RawSegment>, SourceError> {
    let bytes = fs::read(path).map_err(|e| SourceError::io(path.display().to_string(), e))?;
    let content = String::from_utf8_lossy(&bytes).replace('\r', "");
    let mut source = SourceMeta::for_path(path.display().to_string());
    populate_timestamps(&mut source, path);

    Ok(vec![RawSegment::Text {
        content,
        source,
        char_offset: 0,
    }])
}

pub(crate) fn populate_timestamps(source: &mut SourceMeta, path: &Path) {
    if let Ok(md) = fs::metadata(path) {
        if let Ok(created) = md.created() {
            source.created = Some(humantime_rfc3339(created));
        }
        if let Ok(modified) = md.modified() {
            source.modified = Some(humantime_rfc3339(modified));
        }
    }
}

fn humantime_rfc3339(t: std::time::SystemTime) -> String {
    let dt: chrono::DateTime<chrono::Utc> = t.into();
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_whole_file_as_one_segment() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "line one\nline two\n").unwrap();
        let segments = read(f.path()).unwrap();
        assert_eq!(segments.len(), 1);
        match &segments[0] {
            RawSegment::Text { content, .. } => assert!(content.contains("line two")),
            _ => panic!("expected text segment"),
        }
    }
}
