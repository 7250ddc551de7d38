//! Orientation detection for harvested ID photos.
//!
//! Detectors report the clockwise rotation that brings an image upright.
//! They are fail-soft at the call site: an error keeps the image as-is.

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use image::DynamicImage;
use regex::Regex;
use tracing::debug;

use super::PhotoError;

/// Clockwise rotation needed to make an image upright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Map a right-angle degree value (any multiple of 90) to a rotation.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Cw90),
            180 => Some(Rotation::Cw180),
            270 => Some(Rotation::Cw270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

pub fn apply_rotation(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => image,
        Rotation::Cw90 => image.rotate90(),
        Rotation::Cw180 => image.rotate180(),
        Rotation::Cw270 => image.rotate270(),
    }
}

/// Orientation detection abstraction (allows mocking for tests).
pub trait OrientationDetector: Send + Sync {
    fn detect(&self, raw_bytes: &[u8], image: &DynamicImage) -> Result<Rotation, PhotoError>;
}

// ── ExifOrientationDetector ───────────────────────────────

/// Reads EXIF tag 0x0112 (Orientation) via `kamadak-exif`.
///
/// Mirrored variants (2, 4, 5, 7) are reduced to their rotation component;
/// scanned ID photos are never mirrored in practice.
pub struct ExifOrientationDetector;

/// EXIF orientation value, 1 (normal) when absent.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

fn exif_rotation(orientation: u32) -> Rotation {
    match orientation {
        3 | 4 => Rotation::Cw180,
        5 | 6 => Rotation::Cw90,
        7 | 8 => Rotation::Cw270,
        _ => Rotation::None,
    }
}

impl OrientationDetector for ExifOrientationDetector {
    fn detect(&self, raw_bytes: &[u8], _image: &DynamicImage) -> Result<Rotation, PhotoError> {
        Ok(exif_rotation(read_exif_orientation(raw_bytes)))
    }
}

// ── TesseractOsdDetector ──────────────────────────────────

static OSD_ROTATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Rotate:\s*(\d+)").unwrap());

/// Orientation and script detection through the `tesseract` CLI (`--psm 0`).
///
/// The encoded image is piped on stdin; the `Rotate:` line of the report is
/// the clockwise correction.
pub struct TesseractOsdDetector {
    binary: PathBuf,
}

impl TesseractOsdDetector {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractOsdDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the `Rotate:` value out of a tesseract OSD report.
pub fn parse_osd_rotation(report: &str) -> Option<Rotation> {
    let caps = OSD_ROTATE.captures(report)?;
    let degrees: i64 = caps.get(1)?.as_str().parse().ok()?;
    Rotation::from_degrees(degrees)
}

impl OrientationDetector for TesseractOsdDetector {
    fn detect(&self, raw_bytes: &[u8], _image: &DynamicImage) -> Result<Rotation, PhotoError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "--psm", "0"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PhotoError::Orientation(format!("Failed to spawn tesseract: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(raw_bytes)
                .map_err(|e| PhotoError::Orientation(format!("Failed to pipe image: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| PhotoError::Orientation(format!("tesseract did not finish: {e}")))?;

        let report = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            return Err(PhotoError::Orientation(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let rotation = parse_osd_rotation(&report).ok_or_else(|| {
            PhotoError::Orientation("tesseract OSD report has no Rotate line".into())
        })?;
        debug!(degrees = rotation.degrees(), "tesseract OSD orientation");
        Ok(rotation)
    }
}

// ── LeptessOrientationDetector ────────────────────────────

/// The rotation whose upright candidate read with the highest mean
/// confidence. Ties keep the earlier candidate; no positive score means no
/// text was found.
#[cfg(any(feature = "leptess-osd", test))]
pub fn pick_rotation(scores: &[(Rotation, i32)]) -> Option<Rotation> {
    let mut best: Option<(Rotation, i32)> = None;
    for &(rotation, confidence) in scores {
        if confidence > 0 && best.map_or(true, |(_, top)| confidence > top) {
            best = Some((rotation, confidence));
        }
    }
    best.map(|(rotation, _)| rotation)
}

/// In-process Tesseract through `leptess`.
/// Only available when compiled with the `leptess-osd` feature flag.
///
/// Each quarter turn of the image is recognized; the turn Tesseract reads
/// with the best mean confidence is taken as upright.
#[cfg(feature = "leptess-osd")]
pub struct LeptessOrientationDetector {
    tessdata_dir: Option<PathBuf>,
    lang: String,
}

#[cfg(feature = "leptess-osd")]
impl LeptessOrientationDetector {
    pub fn new() -> Self {
        Self {
            tessdata_dir: None,
            lang: "spa".to_string(),
        }
    }

    pub fn with_tessdata(mut self, dir: impl Into<PathBuf>, lang: &str) -> Self {
        self.tessdata_dir = Some(dir.into());
        self.lang = lang.to_string();
        self
    }

    fn confidence(&self, image: &DynamicImage) -> Result<i32, PhotoError> {
        let mut cursor = Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, image::ImageOutputFormat::Png)
            .map_err(|e| PhotoError::Encode(e.to_string()))?;

        let tessdata = self.tessdata_dir.as_deref().and_then(|p| p.to_str());
        let mut tess = leptess::LepTess::new(tessdata, &self.lang)
            .map_err(|e| PhotoError::Orientation(format!("Tesseract init failed: {e:?}")))?;
        tess.set_image_from_mem(&cursor.into_inner())
            .map_err(|e| PhotoError::Orientation(format!("{e:?}")))?;
        tess.get_utf8_text()
            .map_err(|e| PhotoError::Orientation(format!("{e:?}")))?;
        Ok(tess.mean_text_conf())
    }
}

#[cfg(feature = "leptess-osd")]
impl Default for LeptessOrientationDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "leptess-osd")]
impl OrientationDetector for LeptessOrientationDetector {
    fn detect(&self, _raw_bytes: &[u8], image: &DynamicImage) -> Result<Rotation, PhotoError> {
        let mut scores = Vec::with_capacity(4);
        for rotation in [Rotation::None, Rotation::Cw90, Rotation::Cw180, Rotation::Cw270] {
            let candidate = apply_rotation(image.clone(), rotation);
            scores.push((rotation, self.confidence(&candidate)?));
        }
        debug!(?scores, "leptess orientation scores");
        pick_rotation(&scores)
            .ok_or_else(|| PhotoError::Orientation("no readable text in any orientation".into()))
    }
}

// ── ChainedOrientationDetector ────────────────────────────

/// Tries detectors in order; the first non-trivial rotation wins.
///
/// Errors from individual detectors are logged and skipped. The chain only
/// fails when every detector failed.
pub struct ChainedOrientationDetector {
    detectors: Vec<Box<dyn OrientationDetector>>,
}

impl ChainedOrientationDetector {
    pub fn new(detectors: Vec<Box<dyn OrientationDetector>>) -> Self {
        Self { detectors }
    }
}

impl OrientationDetector for ChainedOrientationDetector {
    fn detect(&self, raw_bytes: &[u8], image: &DynamicImage) -> Result<Rotation, PhotoError> {
        let mut last_error = None;
        let mut any_ok = false;

        for detector in &self.detectors {
            match detector.detect(raw_bytes, image) {
                Ok(Rotation::None) => any_ok = true,
                Ok(rotation) => return Ok(rotation),
                Err(e) => {
                    debug!(error = %e, "Orientation detector failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_ok => Err(e),
            _ => Ok(Rotation::None),
        }
    }
}

/// Leaves every image as-is.
pub struct NoOpOrientationDetector;

impl OrientationDetector for NoOpOrientationDetector {
    fn detect(&self, _raw_bytes: &[u8], _image: &DynamicImage) -> Result<Rotation, PhotoError> {
        Ok(Rotation::None)
    }
}

// ── Mocks for testing ─────────────────────────────────────

/// Reports the same rotation for every image.
pub struct MockOrientationDetector {
    rotation: Rotation,
}

impl MockOrientationDetector {
    pub fn new(rotation: Rotation) -> Self {
        Self { rotation }
    }
}

impl OrientationDetector for MockOrientationDetector {
    fn detect(&self, _raw_bytes: &[u8], _image: &DynamicImage) -> Result<Rotation, PhotoError> {
        Ok(self.rotation)
    }
}

/// Fails every detection.
pub struct FailingOrientationDetector;

impl OrientationDetector for FailingOrientationDetector {
    fn detect(&self, _raw_bytes: &[u8], _image: &DynamicImage) -> Result<Rotation, PhotoError> {
        Err(PhotoError::Orientation("mock orientation failure".into()))
    }
}
