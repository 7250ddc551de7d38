//! Persisted photo artifacts.
//!
//! File names are collision-free without locking: document stem, 1-based
//! page, page-local image index, stage tag and a microsecond timestamp.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use image::RgbImage;
use tracing::debug;

use super::PhotoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Oriented,
    Cropped,
}

impl Stage {
    pub fn tag(self) -> &'static str {
        match self {
            Stage::Oriented => "oriented",
            Stage::Cropped => "cropped",
        }
    }

    /// Subdirectory of the artifact root holding this stage.
    pub fn subdir(self) -> &'static str {
        match self {
            Stage::Oriented => "raw",
            Stage::Cropped => "cropped",
        }
    }
}

/// Identifies one harvested image.
#[derive(Debug, Clone)]
pub struct ArtifactKey {
    pub stem: String,
    /// 0-based page index.
    pub page_index: usize,
    pub image_index: usize,
}

pub fn artifact_file_name(key: &ArtifactKey, stage: Stage, at: DateTime<Local>) -> String {
    format!(
        "{}_p{}_i{}_{}_{}.png",
        key.stem,
        key.page_index + 1,
        key.image_index,
        stage.tag(),
        at.format("%Y%m%d_%H%M%S%6f")
    )
}

/// Artifact persistence abstraction (allows mocking for tests).
pub trait ArtifactStore: Send + Sync {
    /// Persist `image`; returns where it went, if anywhere.
    fn persist(
        &self,
        key: &ArtifactKey,
        stage: Stage,
        image: &RgbImage,
    ) -> Result<Option<PathBuf>, PhotoError>;
}

// ── FsArtifactStore ───────────────────────────────────────

/// Writes PNGs under `<root>/raw` and `<root>/cropped`.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create the store and its stage directories.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, PhotoError> {
        let root = root.into();
        for stage in [Stage::Oriented, Stage::Cropped] {
            std::fs::create_dir_all(root.join(stage.subdir()))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for FsArtifactStore {
    fn persist(
        &self,
        key: &ArtifactKey,
        stage: Stage,
        image: &RgbImage,
    ) -> Result<Option<PathBuf>, PhotoError> {
        let path = self
            .root
            .join(stage.subdir())
            .join(artifact_file_name(key, stage, Local::now()));
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| PhotoError::Encode(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "Photo artifact saved");
        Ok(Some(path))
    }
}

/// Discards every artifact (`--no-artifacts`).
pub struct NullArtifactStore;

impl ArtifactStore for NullArtifactStore {
    fn persist(
        &self,
        _key: &ArtifactKey,
        _stage: Stage,
        _image: &RgbImage,
    ) -> Result<Option<PathBuf>, PhotoError> {
        Ok(None)
    }
}

// ── Mock for testing ──────────────────────────────────────

/// Records file names and dimensions instead of writing. Clones share the
/// same record, so a test can keep one while the pipeline owns another.
#[derive(Default, Clone)]
pub struct MemoryArtifactStore {
    saved: Arc<Mutex<Vec<(String, (u32, u32))>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<(String, (u32, u32))> {
        self.saved
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn persist(
        &self,
        key: &ArtifactKey,
        stage: Stage,
        image: &RgbImage,
    ) -> Result<Option<PathBuf>, PhotoError> {
        let name = format!("{}/{}", stage.subdir(), artifact_file_name(key, stage, Local::now()));
        self.saved
            .lock()
            .map_err(|_| PhotoError::Encode("artifact store lock poisoned".into()))?
            .push((name, image.dimensions()));
        Ok(None)
    }
}
