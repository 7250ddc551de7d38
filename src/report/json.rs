//! JSON export of a whole run.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::DocumentRecord;

use super::{ReportError, RunContext, RunSummary};

#[derive(Serialize)]
pub struct RunExport<'a> {
    pub started: DateTime<Local>,
    pub root: &'a Path,
    pub summary: &'a RunSummary,
    pub records: &'a [DocumentRecord],
}

pub fn write_json(
    path: &Path,
    records: &[DocumentRecord],
    summary: &RunSummary,
    context: &RunContext<'_>,
) -> Result<(), ReportError> {
    let export = RunExport {
        started: context.started,
        root: context.root,
        summary,
        records,
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn export_carries_summary_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let records = fixtures::records();
        let summary = RunSummary::from_records(&records);
        let context = RunContext {
            root: Path::new("/cases"),
            started: fixtures::started(),
        };

        write_json(&path, &records, &summary, &context).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["root"], "/cases");
        assert_eq!(value["summary"]["documents"], 3);
        assert_eq!(value["records"].as_array().unwrap().len(), 3);
        assert_eq!(value["records"][0]["identity_numbers"]["ANSES"], "20111222224");
        assert_eq!(value["records"][1]["consistency"], "incoherent");
        assert_eq!(value["records"][2]["read_error"], true);
    }
}
