//! Case-file reading via Google PDFium.
//!
//! `PdfiumReader` is stateless (`Send + Sync`). Each operation creates a fresh
//! `Pdfium` instance because the upstream type is `!Send`. The OS caches
//! `dlopen`/`LoadLibrary` calls, so repeat loads are near-free.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use image::ImageOutputFormat;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::types::{DocumentReader, EmbeddedImage};
use super::ExtractionError;

/// Environment variable holding an explicit path to the PDFium library.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Reads page text and embedded images using Google PDFium.
pub struct PdfiumReader;

impl PdfiumReader {
    /// Create a reader, verifying the PDFium library is loadable (fail-fast).
    pub fn new() -> Result<Self, ExtractionError> {
        let _ = load_pdfium()?;
        Ok(Self)
    }
}

/// Load the PDFium dynamic library.
///
/// Discovery order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` env var (explicit path)
/// 2. Alongside the running executable, then `<exe_dir>/pdfium/lib`
/// 3. System library search paths
fn load_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_ENV) {
        debug!(path = %path, "Loading PDFium from env var");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            ExtractionError::LibraryUnavailable(format!("Failed to load PDFium from {path}: {e}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let candidates = [exe_dir.to_path_buf(), exe_dir.join("pdfium").join("lib")];

            for dir in &candidates {
                let lib_path = Pdfium::pdfium_platform_library_name_at_path(
                    dir.to_string_lossy().as_ref(),
                );
                if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                    debug!(dir = %dir.display(), "Loaded PDFium from candidate directory");
                    return Ok(Pdfium::new(bindings));
                }
            }
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        ExtractionError::LibraryUnavailable(format!(
            "PDFium library not found. Set {PDFIUM_LIB_ENV} or install PDFium: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Map PDF load errors, singling out encrypted documents.
fn map_load_error(path: &Path, e: PdfiumError) -> ExtractionError {
    let msg = format!("{e}");
    let lower = msg.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        ExtractionError::PdfEncrypted
    } else {
        ExtractionError::PdfLoad {
            path: path.to_path_buf(),
            reason: msg,
        }
    }
}

fn encode_png(image: &image::DynamicImage) -> Result<Vec<u8>, ExtractionError> {
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

impl DocumentReader for PdfiumReader {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| map_load_error(path, e))?;

        let mut texts = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let text = page.text().map_err(|e| ExtractionError::PageText {
                page: index,
                reason: e.to_string(),
            })?;
            texts.push(text.all());
        }

        debug!(path = %path.display(), pages = texts.len(), "Extracted page texts");
        Ok(texts)
    }

    fn page_images(
        &self,
        path: &Path,
        page_index: usize,
    ) -> Result<Vec<EmbeddedImage>, ExtractionError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| map_load_error(path, e))?;

        let pages = document.pages();
        let count = pages.len() as usize;
        let index = u16::try_from(page_index)
            .map_err(|_| ExtractionError::PageOutOfRange {
                page: page_index,
                count,
            })?;
        let page = pages
            .get(index)
            .map_err(|_| ExtractionError::PageOutOfRange {
                page: page_index,
                count,
            })?;

        let mut images = Vec::new();
        let mut image_index = 0;
        for object in page.objects().iter() {
            let Some(image_object) = object.as_image_object() else {
                continue;
            };
            let current = image_index;
            image_index += 1;

            let encoded = image_object
                .get_raw_image()
                .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))
                .and_then(|raw| encode_png(&raw));

            match encoded {
                Ok(bytes) => images.push(EmbeddedImage {
                    page_index,
                    index: current,
                    bytes,
                }),
                Err(e) => warn!(
                    path = %path.display(),
                    page = page_index,
                    image = current,
                    error = %e,
                    "Skipping undecodable embedded image"
                ),
            }
        }

        debug!(
            path = %path.display(),
            page = page_index,
            images = images.len(),
            "Collected embedded images"
        );
        Ok(images)
    }
}

// ── Mock for testing ──────────────────────────────────────

/// In-memory reader serving fixed page texts and image bytes.
///
/// Used by orchestrator, photo and batch tests that need a `DocumentReader`
/// without requiring the actual PDFium binary.
#[derive(Default)]
pub struct MockDocumentReader {
    pages: Vec<String>,
    images: HashMap<usize, Vec<Vec<u8>>>,
    fail_text: bool,
}

impl MockDocumentReader {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// A reader whose text extraction always fails.
    pub fn failing() -> Self {
        Self {
            fail_text: true,
            ..Self::default()
        }
    }

    /// Attach encoded image bytes to a 0-based page.
    pub fn with_image(mut self, page_index: usize, bytes: Vec<u8>) -> Self {
        self.images.entry(page_index).or_default().push(bytes);
        self
    }
}

impl DocumentReader for MockDocumentReader {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, ExtractionError> {
        if self.fail_text {
            return Err(ExtractionError::PdfLoad {
                path: path.to_path_buf(),
                reason: "mock read failure".into(),
            });
        }
        Ok(self.pages.clone())
    }

    fn page_images(
        &self,
        _path: &Path,
        page_index: usize,
    ) -> Result<Vec<EmbeddedImage>, ExtractionError> {
        if page_index >= self.pages.len() {
            return Err(ExtractionError::PageOutOfRange {
                page: page_index,
                count: self.pages.len(),
            });
        }
        Ok(self
            .images
            .get(&page_index)
            .map(|list| {
                list.iter()
                    .enumerate()
                    .map(|(index, bytes)| EmbeddedImage {
                        page_index,
                        index,
                        bytes: bytes.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_error_maps_to_encrypted() {
        let err = map_load_error(
            Path::new("a.pdf"),
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError),
        );
        assert!(matches!(err, ExtractionError::PdfEncrypted));
    }

    #[test]
    fn format_error_keeps_path() {
        let err = map_load_error(
            Path::new("a.pdf"),
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError),
        );
        assert!(matches!(err, ExtractionError::PdfLoad { .. }));
        assert!(err.to_string().contains("a.pdf"));
    }

    #[test]
    fn mock_returns_pages_in_order() {
        let mock = MockDocumentReader::new(vec!["uno".into(), "dos".into()]);
        let pages = mock.page_texts(Path::new("x.pdf")).unwrap();
        assert_eq!(pages, vec!["uno".to_string(), "dos".to_string()]);
    }

    #[test]
    fn mock_failure_is_a_load_error() {
        let mock = MockDocumentReader::failing();
        let err = mock.page_texts(Path::new("x.pdf")).unwrap_err();
        assert!(err.to_string().contains("x.pdf"));
    }

    #[test]
    fn mock_images_carry_page_local_index() {
        let mock = MockDocumentReader::new(vec![String::new(); 3])
            .with_image(1, vec![1])
            .with_image(1, vec![2]);
        let images = mock.page_images(Path::new("x.pdf"), 1).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].index, 1);
        assert_eq!(images[1].page_index, 1);
        assert!(mock.page_images(Path::new("x.pdf"), 0).unwrap().is_empty());
    }

    #[test]
    fn mock_rejects_out_of_range_page() {
        let mock = MockDocumentReader::new(vec![String::new()]);
        let err = mock.page_images(Path::new("x.pdf"), 4).unwrap_err();
        assert!(matches!(err, ExtractionError::PageOutOfRange { page: 4, count: 1 }));
    }
}
