//! Fatal, run-level errors. Anything scoped to one case file is recorded on
//! its `DocumentRecord` instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::photo::PhotoError;
use crate::report::ReportError;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Cannot read root folder {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker pool setup failed: {0}")]
    WorkerPool(String),

    #[error("Document reader unavailable: {0}")]
    Reader(#[from] ExtractionError),

    #[error("Artifact directory unusable: {0}")]
    Artifacts(#[from] PhotoError),

    #[error("Report writing failed: {0}")]
    Report(#[from] ReportError),
}
