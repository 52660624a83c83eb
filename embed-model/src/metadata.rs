//! Well-known `EmbedUnit.metadata` keys, named once so every crate agrees.

pub const FILE_NAME: &str = "file_name";
pub const FILE_PATH: &str = "file_path";
pub const PAGE_NUMBER: &str = "page_number";
pub const CHUNK_INDEX: &str = "chunk_index";
pub const CREATED: &str = "created";
pub const MODIFIED: &str = "modified";
/// Present on image-document units: PNG bytes, base64-encoded.
pub const IMAGE: &str = "image";
/// Present on audio-derived units.
pub const START_MS: &str = "start_ms";
pub const END_MS: &str = "end_ms";
/// Present on video-derived units.
pub const FRAME_INDEX: &str = "frame_index";
/// Set to `"true"` when a single sentence/word atom exceeded `chunk_size`
/// and had to be emitted intact rather than split.
pub const CHUNK_TOO_LARGE: &str = "chunk_too_large";
