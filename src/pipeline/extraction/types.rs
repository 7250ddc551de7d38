use std::path::Path;

use serde::Serialize;

use super::ExtractionError;

/// Page-ordered text of one case file, read once per document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseText {
    pages: Vec<String>,
    full: String,
}

impl CaseText {
    pub fn from_pages(pages: Vec<String>) -> Self {
        let full = pages.join("\n").trim().to_string();
        Self { pages, full }
    }

    /// Whole-document text: pages joined by newlines, trimmed.
    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    pub fn last_page(&self) -> Option<&str> {
        self.pages.last().map(String::as_str)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// One embedded raster image, re-encoded as PNG.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// 0-based page index.
    pub page_index: usize,
    /// Page-local image index, in object order.
    pub index: usize,
    pub bytes: Vec<u8>,
}

/// Case-file reading abstraction (allows mocking for tests).
///
/// Implementations are shared across worker threads.
pub trait DocumentReader: Send + Sync {
    /// Text of every page, in page order.
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, ExtractionError>;

    /// Every embedded raster image on one page. Images that cannot be
    /// decoded are skipped by the implementation, not reported as errors.
    fn page_images(
        &self,
        path: &Path,
        page_index: usize,
    ) -> Result<Vec<EmbeddedImage>, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_text_joins_and_trims() {
        let text = CaseText::from_pages(vec![
            "  Caratula".into(),
            "Formulario".into(),
            "ultima\n".into(),
        ]);
        assert_eq!(text.full(), "Caratula\nFormulario\nultima");
        assert_eq!(text.page_count(), 3);
        assert_eq!(text.last_page(), Some("ultima\n"));
    }

    #[test]
    fn empty_document_has_no_last_page() {
        let text = CaseText::from_pages(Vec::new());
        assert_eq!(text.full(), "");
        assert_eq!(text.last_page(), None);
        assert_eq!(text.page(0), None);
    }
}
