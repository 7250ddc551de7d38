//! Per-run reports: CSV table, plain-text log and optional JSON export.
//!
//! All files of one run share the base name `expedientes_<YYYYmmdd_HHMMSS>`
//! and land in the output directory.

pub mod csv;
pub mod json;
pub mod log;
pub mod summary;

pub use summary::RunSummary;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;

use crate::models::DocumentRecord;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot create report directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Files produced by one run.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub csv: PathBuf,
    pub log: PathBuf,
    pub json: Option<PathBuf>,
}

/// Everything a report needs to know about the run besides the records.
pub struct RunContext<'a> {
    pub root: &'a Path,
    pub started: DateTime<Local>,
}

impl RunContext<'_> {
    pub fn base_name(&self) -> String {
        format!("expedientes_{}", self.started.format("%Y%m%d_%H%M%S"))
    }
}

/// Write the CSV and the log (and the JSON export when asked) into
/// `output_dir`, creating it if needed.
pub fn write_reports(
    records: &[DocumentRecord],
    context: &RunContext<'_>,
    output_dir: &Path,
    with_json: bool,
) -> Result<ReportPaths, ReportError> {
    std::fs::create_dir_all(output_dir).map_err(|source| ReportError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let base = context.base_name();
    let summary = RunSummary::from_records(records);

    let csv_path = output_dir.join(format!("{base}.csv"));
    csv::write_csv(&csv_path, records)?;

    let log_path = output_dir.join(format!("log_{base}.txt"));
    log::write_log(&log_path, records, &summary, context, &csv_path)?;

    let json_path = if with_json {
        let path = output_dir.join(format!("{base}.json"));
        json::write_json(&path, records, &summary, context)?;
        Some(path)
    } else {
        None
    };

    info!(
        csv = %csv_path.display(),
        log = %log_path.display(),
        documents = records.len(),
        "Reports written"
    );

    Ok(ReportPaths {
        csv: csv_path,
        log: log_path,
        json: json_path,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Consistency, Origin};

    pub fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    /// One clean record, one incoherent, one unreadable.
    pub fn records() -> Vec<DocumentRecord> {
        let mut clean = DocumentRecord::new("/cases/A-000001-2025.pdf");
        clean.cover.detected = true;
        clean.cover.complete = true;
        clean.renaper.detected = true;
        clean.front_photo = true;
        clean.back_photo = true;
        clean.register_identity(Origin::Global, "20111222224");
        clean.register_identity(Origin::Anses, "20111222224");
        clean.set_consistency(Consistency::Coherent);

        let mut mixed = DocumentRecord::new("/cases/B-000002-2025.pdf");
        mixed.cover.detected = true;
        mixed.cover.complete = true;
        mixed.register_identity(Origin::Anses, "20111222224");
        mixed.register_identity(Origin::Negative, "27111222229");
        mixed.observe("Inconsistent CUILs across sections.");
        mixed.observe("ANSES not found.");
        mixed.set_consistency(Consistency::Incoherent);

        let mut broken = DocumentRecord::new("/cases/C-000003-2025.pdf");
        broken.read_error = true;
        broken.observe("Could not read document: damaged");

        vec![clean, mixed, broken]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_csv_and_log_with_shared_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let context = RunContext {
            root: Path::new("/cases"),
            started: fixtures::started(),
        };

        let paths = write_reports(&fixtures::records(), &context, &out, false).unwrap();

        assert!(paths.csv.ends_with("expedientes_20250314_092653.csv"));
        assert!(paths.log.ends_with("log_expedientes_20250314_092653.txt"));
        assert!(paths.csv.exists() && paths.log.exists());
        assert!(paths.json.is_none());
    }

    #[test]
    fn json_export_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let context = RunContext {
            root: Path::new("/cases"),
            started: fixtures::started(),
        };

        let paths = write_reports(&fixtures::records(), &context, dir.path(), true).unwrap();

        let json = paths.json.unwrap();
        assert!(json.ends_with("expedientes_20250314_092653.json"));
        assert!(json.exists());
    }

    #[test]
    fn unusable_output_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"file").unwrap();
        let context = RunContext {
            root: Path::new("/cases"),
            started: fixtures::started(),
        };

        let err = write_reports(&[], &context, &blocker.join("sub"), false).unwrap_err();
        assert!(matches!(err, ReportError::OutputDir { .. }));
    }
}
