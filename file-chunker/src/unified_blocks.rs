use std::collections::BTreeMap;

/// The coarse kind of a block of extracted text. Used only internally by the
/// PDF backends to decide which lines are running headers/footers versus
/// body text before the page is collapsed to a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedBlock {
    pub kind: BlockKind,
    pub text: String,
    pub order: u32,
    pub source_path: String,
    pub reader_backend: String,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
    pub attrs: BTreeMap<String, String>,
}

impl UnifiedBlock {
    pub fn new(
        kind: BlockKind,
        text: impl Into<String>,
        order: u32,
        source_path: impl Into<String>,
        reader_backend: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            order,
            source_path: source_path.into(),
            reader_backend: reader_backend.into(),
            page_start: None,
            page_end: None,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_pages(mut self, start: Option<u32>, end: Option<u32>) -> Self {
        self.page_start = start;
        self.page_end = end;
        self
    }
}
