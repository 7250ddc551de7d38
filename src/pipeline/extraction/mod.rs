pub mod types;
pub mod pdfium;

pub use types::*;
pub use pdfium::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDFium library unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("Failed to open {path}: {reason}")]
    PdfLoad { path: PathBuf, reason: String },

    #[error("PDF is encrypted or password-protected")]
    PdfEncrypted,

    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("Text extraction failed on page {page}: {reason}")]
    PageText { page: usize, reason: String },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),
}
