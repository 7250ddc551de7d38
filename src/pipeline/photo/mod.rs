//! Identification-photo evidence.
//!
//! The ID card scans sit on the pages just before the RENAPER report. For
//! each case file the pipeline locates that report, harvests every embedded
//! image on the preceding pages and runs each one through:
//! decode -> orientation -> rectification -> color classification.
//! Images are independent; a failure or panic on one drops only that image.

pub mod artifacts;
pub mod color;
pub mod duplicate;
pub mod orientation;
pub mod rectify;

pub use artifacts::*;
pub use orientation::*;
pub use rectify::{CropMethod, Rectified};

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use image::RgbImage;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PhotoConfig;
use crate::models::DocumentRecord;
use crate::pipeline::detectors::renaper;
use crate::pipeline::extraction::{CaseText, DocumentReader, EmbeddedImage};

/// Maximum encoded image size accepted for decoding.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image data is empty")]
    Empty,

    #[error("Image data exceeds {limit_mb}MB limit")]
    TooLarge { limit_mb: usize },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Orientation detection failed: {0}")]
    Orientation(String),
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Pages inspected for ID photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoWindow {
    /// 0-based page of the RENAPER report, when found within the lookahead.
    pub anchor_page: Option<usize>,
    /// 0-based pages, ascending.
    pub pages: Vec<usize>,
    pub fallback: bool,
}

/// What survived the pipeline for one harvested image.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoEvidence {
    pub page_index: usize,
    pub image_index: usize,
    pub rotation: Rotation,
    pub method: CropMethod,
    pub width: u32,
    pub height: u32,
    pub saturated_fraction: f64,
    pub is_color: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhotoSummary {
    pub window: PhotoWindow,
    pub harvested: usize,
    pub evidence: Vec<PhotoEvidence>,
}

struct ProcessedPhoto {
    evidence: PhotoEvidence,
    image: RgbImage,
}

// ═══════════════════════════════════════════════════════════
// Pipeline
// ═══════════════════════════════════════════════════════════

pub struct PhotoEvidencePipeline {
    orientation: Box<dyn OrientationDetector>,
    artifacts: Box<dyn ArtifactStore>,
    config: PhotoConfig,
}

impl PhotoEvidencePipeline {
    pub fn new(
        orientation: Box<dyn OrientationDetector>,
        artifacts: Box<dyn ArtifactStore>,
        config: PhotoConfig,
    ) -> Self {
        Self {
            orientation,
            artifacts,
            config,
        }
    }

    pub fn config(&self) -> &PhotoConfig {
        &self.config
    }

    /// Locate the RENAPER anchor and derive the pages to harvest.
    pub fn window(&self, text: &CaseText) -> PhotoWindow {
        let lookahead = self.config.anchor_lookahead.min(text.page_count());
        let anchor_page = text.pages()[..lookahead]
            .iter()
            .position(|page| renaper::mentions_report(page));

        if let Some(anchor) = anchor_page.filter(|&a| a > 0) {
            let start = anchor.saturating_sub(self.config.window_pages);
            return PhotoWindow {
                anchor_page,
                pages: (start..anchor).collect(),
                fallback: false,
            };
        }

        let pages: Vec<usize> = self
            .config
            .fallback_pages
            .iter()
            .copied()
            .filter(|&p| p < text.page_count())
            .collect();
        PhotoWindow {
            anchor_page,
            pages,
            fallback: true,
        }
    }

    /// Harvest, process and tally the ID photos of one case file, updating
    /// the record's photo flags and observations.
    pub fn evaluate(
        &self,
        record: &mut DocumentRecord,
        text: &CaseText,
        reader: &dyn DocumentReader,
    ) -> PhotoSummary {
        let window = self.window(text);
        if window.fallback {
            warn!(
                path = %record.path().display(),
                anchor_page = ?window.anchor_page,
                pages = ?window.pages,
                "RENAPER anchor unusable for photo window, using fallback pages"
            );
        }

        let images = self.harvest(record.path(), &window.pages, reader);
        let stem = record.stem();

        let outcomes: Vec<_> = images
            .par_iter()
            .map(|image| {
                let outcome = catch_unwind(AssertUnwindSafe(|| self.process(&stem, image)));
                (image.page_index, image.index, outcome)
            })
            .collect();

        let mut processed = Vec::new();
        for (page, index, outcome) in outcomes {
            match outcome {
                Ok(Ok(photo)) => processed.push(photo),
                Ok(Err(e)) => warn!(
                    path = %record.path().display(),
                    page,
                    image = index,
                    error = %e,
                    "Skipping ID photo candidate"
                ),
                Err(_) => warn!(
                    path = %record.path().display(),
                    page,
                    image = index,
                    "ID photo processing panicked, skipping image"
                ),
            }
        }

        self.tally(record, &window, &processed);

        PhotoSummary {
            window,
            harvested: images.len(),
            evidence: processed.into_iter().map(|p| p.evidence).collect(),
        }
    }

    fn harvest(
        &self,
        path: &Path,
        pages: &[usize],
        reader: &dyn DocumentReader,
    ) -> Vec<EmbeddedImage> {
        let mut images = Vec::new();
        for &page in pages {
            match reader.page_images(path, page) {
                Ok(found) => images.extend(found),
                Err(e) => warn!(
                    path = %path.display(),
                    page,
                    error = %e,
                    "Could not read embedded images"
                ),
            }
        }
        debug!(path = %path.display(), count = images.len(), "Harvested ID photo candidates");
        images
    }

    fn process(&self, stem: &str, embedded: &EmbeddedImage) -> Result<ProcessedPhoto, PhotoError> {
        validate_image_bytes(&embedded.bytes)?;
        let decoded = image::load_from_memory(&embedded.bytes)
            .map_err(|e| PhotoError::Decode(e.to_string()))?;

        let rotation = match self.orientation.detect(&embedded.bytes, &decoded) {
            Ok(rotation) => rotation,
            Err(e) => {
                debug!(error = %e, "Orientation unknown, keeping image as-is");
                Rotation::None
            }
        };
        let oriented = apply_rotation(decoded, rotation).to_rgb8();

        let key = ArtifactKey {
            stem: stem.to_string(),
            page_index: embedded.page_index,
            image_index: embedded.index,
        };
        self.persist(&key, Stage::Oriented, &oriented);

        let rectified = rectify::rectify(&oriented, &self.config);
        self.persist(&key, Stage::Cropped, &rectified.image);

        let reading = color::classify(
            &rectified.image,
            self.config.saturation_threshold,
            self.config.color_fraction,
        );
        let (width, height) = rectified.image.dimensions();

        Ok(ProcessedPhoto {
            evidence: PhotoEvidence {
                page_index: embedded.page_index,
                image_index: embedded.index,
                rotation,
                method: rectified.method,
                width,
                height,
                saturated_fraction: reading.saturated_fraction,
                is_color: reading.is_color,
            },
            image: rectified.image,
        })
    }

    // Artifact failures never drop the image.
    fn persist(&self, key: &ArtifactKey, stage: Stage, image: &RgbImage) {
        if let Err(e) = self.artifacts.persist(key, stage, image) {
            warn!(stem = %key.stem, stage = stage.tag(), error = %e, "Failed to persist photo artifact");
        }
    }

    fn tally(&self, record: &mut DocumentRecord, window: &PhotoWindow, processed: &[ProcessedPhoto]) {
        match processed.len() {
            0 => record.observe(format!(
                "No ID photos found (pages inspected: {}).",
                page_list(window.pages.iter().copied())
            )),
            1 => {
                record.front_photo = true;
                record.observe(format!(
                    "Only 1 ID photo found (page {}); expected front and back.",
                    page_list(processed.iter().map(|p| p.evidence.page_index))
                ));
            }
            _ => {
                record.front_photo = true;
                record.back_photo = true;
            }
        }

        if !processed.is_empty() && !processed.iter().any(|p| p.evidence.is_color) {
            record.observe("ID photos look monochrome (probable photocopy).");
        }

        if let [front, back, ..] = processed {
            let score = duplicate::similarity(&front.image, &back.image);
            if score >= self.config.duplicate_similarity {
                record.observe(format!(
                    "Front and back ID photos look identical (similarity {score:.2})."
                ));
            }
        }
    }
}

/// 1-based, comma-separated page numbers; "none" when empty.
fn page_list(pages: impl Iterator<Item = usize>) -> String {
    let list: Vec<String> = pages.map(|p| (p + 1).to_string()).collect();
    if list.is_empty() {
        "none".to_string()
    } else {
        list.join(", ")
    }
}

/// Reject clearly invalid input before decoding.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), PhotoError> {
    if bytes.is_empty() {
        return Err(PhotoError::Empty);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(PhotoError::TooLarge {
            limit_mb: MAX_IMAGE_BYTES / (1024 * 1024),
        });
    }
    Ok(())
}
