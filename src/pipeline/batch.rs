//! Case-file discovery and parallel validation.
//!
//! Documents are independent: each one is validated on the rayon pool and
//! owns its record for the whole pass. Results come back in discovery order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::AuditError;
use crate::models::DocumentRecord;
use crate::pipeline::processor::ValidationOrchestrator;

static CASE_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[A-Z]-\d{6}-\d{4}\.pdf$").unwrap());

/// Whether a file name follows the case-file convention (`E-000123-2025.pdf`).
pub fn is_case_file(file_name: &str) -> bool {
    CASE_FILE_NAME.is_match(file_name)
}

/// Every case file under `root`, recursively, sorted by path.
///
/// An unreadable root is fatal; unreadable subdirectories are skipped.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>, AuditError> {
    std::fs::read_dir(root).map_err(|source| AuditError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .map(is_case_file)
            .unwrap_or(false);
        if matches {
            found.push(entry.into_path());
        }
    }
    found.sort();

    info!(root = %root.display(), count = found.len(), "Case files discovered");
    Ok(found)
}

/// Validate every path on a pool of `jobs` threads (rayon's default when
/// `None`). One record per path, in input order.
pub fn run_batch(
    orchestrator: &ValidationOrchestrator,
    paths: &[PathBuf],
    jobs: Option<usize>,
) -> Result<Vec<DocumentRecord>, AuditError> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = jobs.filter(|&n| n > 0) {
        builder = builder.num_threads(n);
    }
    let pool = builder
        .build()
        .map_err(|e| AuditError::WorkerPool(e.to_string()))?;

    debug!(threads = pool.current_num_threads(), documents = paths.len(), "Starting batch");

    let records = pool.install(|| {
        paths
            .par_iter()
            .map(|path| validate_guarded(orchestrator, path))
            .collect()
    });
    Ok(records)
}

/// Validate one document; a panic anywhere in its evaluation flags only
/// that record.
fn validate_guarded(orchestrator: &ValidationOrchestrator, path: &Path) -> DocumentRecord {
    match catch_unwind(AssertUnwindSafe(|| orchestrator.validate(path))) {
        Ok(record) => record,
        Err(_) => {
            error!(path = %path.display(), "Validation panicked");
            let mut record = DocumentRecord::new(path);
            record.read_error = true;
            record.observe("Unexpected failure while processing document.");
            record
        }
    }
}
