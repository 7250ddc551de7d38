//! One CSV row per case file.

use std::path::Path;

use crate::models::{Consistency, DocumentRecord};

use super::ReportError;

pub const HEADER: [&str; 6] = [
    "#",
    "Document",
    "CUILs",
    "Coherent CUIL",
    "Read error",
    "Observations",
];

const EMPTY: &str = "-";

fn coherence_cell(verdict: Consistency) -> &'static str {
    match verdict {
        Consistency::Coherent => "yes",
        Consistency::Incoherent => "no",
        Consistency::Unevaluated => "n/a",
    }
}

fn or_empty(value: String) -> String {
    if value.is_empty() {
        EMPTY.to_string()
    } else {
        value
    }
}

/// Cells for the 1-based row `index`.
pub fn row(index: usize, record: &DocumentRecord) -> [String; 6] {
    [
        index.to_string(),
        record.path().display().to_string(),
        or_empty(record.identity_numbers().describe("; ")),
        coherence_cell(record.consistency()).to_string(),
        if record.read_error { "yes" } else { "no" }.to_string(),
        or_empty(record.observations().join(" | ")),
    ]
}

pub fn write_csv(path: &Path, records: &[DocumentRecord]) -> Result<(), ReportError> {
    let mut writer = ::csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    for (i, record) in records.iter().enumerate() {
        writer.write_record(row(i + 1, record))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    #[test]
    fn rows_follow_record_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &fixtures::records()).unwrap();

        let mut reader = ::csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, HEADER);

        let rows: Vec<::csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][1], "/cases/A-000001-2025.pdf");
        assert_eq!(&rows[0][2], "GLOBAL:20111222224; ANSES:20111222224");
        assert_eq!(&rows[0][3], "yes");
        assert_eq!(&rows[0][5], "-");
        assert_eq!(&rows[1][3], "no");
        assert_eq!(
            &rows[1][5],
            "Inconsistent CUILs across sections. | ANSES not found."
        );
        assert_eq!(&rows[2][2], "-");
        assert_eq!(&rows[2][3], "n/a");
        assert_eq!(&rows[2][4], "yes");
    }
}
