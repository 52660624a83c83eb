use std::io::Write;
use std::path::Path;

use embed_model::RawSegment;

use crate::error::SourceError;
use crate::{read_source, ReadConfig};

/// Downloads `url` to a scoped temp file and delegates to the local reader
/// chosen by the URL's extension. The temp file is removed when this
/// function returns, on every exit path, because `tempfile::NamedTempFile`
/// cleans up on drop.
pub fn read(url: &str, config: &ReadConfig<'_>) -> Result<Vec<RawSegment>, SourceError> {
    let response = ureq::get(url).call().map_err(|e| SourceError::Remote {
        uri: url.to_string(),
        reason: e.to_string(),
    })?;

    let ext = Path::new(url)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("txt");

    let mut tmp = tempfile::Builder::new()
        .suffix(&format!(".{ext}"))
        .tempfile()
        .map_err(|e| SourceError::Remote {
            uri: url.to_string(),
            reason: e.to_string(),
        })?;

    let mut reader = response.into_reader();
    std::io::copy(&mut reader, &mut tmp).map_err(|e| SourceError::Remote {
        uri: url.to_string(),
        reason: e.to_string(),
    })?;
    tmp.flush().map_err(|e| SourceError::Remote {
        uri: url.to_string(),
        reason: e.to_string(),
    })?;

    let mut segments = read_source(tmp.path(), config)?;
    for seg in &mut segments {
        match seg {
            RawSegment::Text { source, .. }
            | RawSegment::Image { source, .. }
            | RawSegment::AudioFrame { source, .. } => {
                source.file_path = url.to_string();
                source.file_name = Path::new(url)
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| url.to_string());
            }
        }
    }
    // `tmp` drops here, deleting the scratch file regardless of how
    // `read_path` above returned.
    Ok(segments)
}
