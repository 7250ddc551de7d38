//! Run configuration.
//!
//! Constants, environment overrides and the tunables the photo pipeline uses.
//! CLI flags take precedence over environment variables, which take
//! precedence over the defaults below.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "WolfSight";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Report directory override.
pub const OUTPUT_DIR_ENV: &str = "WOLFSIGHT_OUTPUT_DIR";
/// Artifact directory override.
pub const ARTIFACT_DIR_ENV: &str = "WOLFSIGHT_ARTIFACT_DIR";

const DEFAULT_OUTPUT_DIR: &str = "logs";
const DEFAULT_ARTIFACT_DIR: &str = "extracted_dni";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "wolfsight_lib=info,wolfsight=info,warn"
}

/// Directory for CSV, log and JSON reports.
pub fn default_output_dir() -> PathBuf {
    env_dir(OUTPUT_DIR_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Directory for persisted photo artifacts.
pub fn default_artifact_dir() -> PathBuf {
    env_dir(ARTIFACT_DIR_ENV).unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR))
}

fn env_dir(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

// ═══════════════════════════════════════════════════════════
// Photo pipeline tunables
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct PhotoConfig {
    /// Pages scanned from the start when looking for the RENAPER anchor.
    pub anchor_lookahead: usize,
    /// Pages immediately preceding the anchor that form the window.
    pub window_pages: usize,
    /// 0-based pages used when no usable window exists.
    pub fallback_pages: Vec<usize>,
    /// Target size of the perspective-corrected card (landscape).
    pub card_width: u32,
    pub card_height: u32,
    /// Accepted long/short side ratio for a card quadrilateral.
    pub card_aspect_min: f64,
    pub card_aspect_max: f64,
    /// Margin around the bounding-box crop fallback.
    pub crop_margin: u32,
    /// HSV saturation above which a pixel counts as saturated.
    pub saturation_threshold: f32,
    /// Saturated fraction above which an image is classified as color.
    pub color_fraction: f64,
    /// Perceptual-hash similarity at which front and back count as duplicates.
    pub duplicate_similarity: f64,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            anchor_lookahead: 15,
            window_pages: 3,
            fallback_pages: vec![1, 2],
            card_width: 856,
            card_height: 540,
            card_aspect_min: 1.4,
            card_aspect_max: 1.8,
            crop_margin: 12,
            saturation_threshold: 0.25,
            color_fraction: 0.045,
            duplicate_similarity: 0.95,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Run configuration
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct AuditConfig {
    /// Folder walked recursively for case files.
    pub root: PathBuf,
    pub output_dir: PathBuf,
    /// `None` disables artifact persistence.
    pub artifact_dir: Option<PathBuf>,
    /// Also write a JSON export of every record.
    pub json: bool,
    /// Worker threads; `None` lets rayon decide.
    pub jobs: Option<usize>,
    /// Ask the external tesseract OSD detector when EXIF has no orientation.
    pub osd: bool,
    pub photo: PhotoConfig,
}

impl AuditConfig {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            output_dir: default_output_dir(),
            artifact_dir: Some(default_artifact_dir()),
            json: false,
            jobs: None,
            osd: true,
            photo: PhotoConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_wolfsight() {
        assert_eq!(APP_NAME, "WolfSight");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().contains("wolfsight_lib=info"));
    }

    #[test]
    fn photo_defaults_match_card_geometry() {
        let photo = PhotoConfig::default();
        assert_eq!((photo.card_width, photo.card_height), (856, 540));
        let aspect = photo.card_width as f64 / photo.card_height as f64;
        assert!(aspect > photo.card_aspect_min && aspect < photo.card_aspect_max);
        assert_eq!(photo.fallback_pages, vec![1, 2]);
    }

    #[test]
    fn new_config_enables_artifacts() {
        let config = AuditConfig::new("/data/cases");
        assert_eq!(config.root, PathBuf::from("/data/cases"));
        assert!(config.artifact_dir.is_some());
        assert!(!config.json);
    }
}
