//! Plain-text run log: per-document detail followed by the aggregate counters.

use std::fmt::Write as _;
use std::path::Path;

use crate::models::{Consistency, DocumentRecord, Section};

use super::{ReportError, RunContext, RunSummary};

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn render_record(out: &mut String, record: &DocumentRecord) -> std::fmt::Result {
    writeln!(out, "Case file: {}", record.path().display())?;
    if record.read_error {
        writeln!(out, "  - Read error: yes")?;
    }
    for section in Section::ALL {
        let status = record.section(section);
        writeln!(
            out,
            "  - {} detected / complete: {} / {}",
            section.label(),
            flag(status.detected),
            flag(status.complete)
        )?;
    }
    writeln!(out, "  - ID photos (front + back): {}", flag(record.both_photos()))?;
    if let Some(dni) = &record.national_id {
        writeln!(out, "  - DNI: {dni}")?;
    }
    let numbers = record.identity_numbers().describe(", ");
    writeln!(
        out,
        "  - CUILs: {}",
        if numbers.is_empty() { "-" } else { numbers.as_str() }
    )?;
    let coherent = match record.consistency() {
        Consistency::Coherent => "yes",
        Consistency::Incoherent => "no",
        Consistency::Unevaluated => "n/a",
    };
    writeln!(out, "  - Coherent CUIL: {coherent}")?;

    if !record.observations().is_empty() {
        writeln!(out, "  - Observations:")?;
        for observation in record.observations() {
            writeln!(out, "      * {observation}")?;
        }
    }
    writeln!(out)
}

/// Render the full log as a string.
pub fn render(
    records: &[DocumentRecord],
    summary: &RunSummary,
    context: &RunContext<'_>,
    csv_path: &Path,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Case file audit - {}",
        context.started.format("%Y%m%d_%H%M%S")
    )?;
    writeln!(out, "Root folder: {}", context.root.display())?;
    writeln!(out, "Case files found: {}", records.len())?;
    writeln!(out)?;

    for record in records {
        render_record(&mut out, record)?;
    }

    writeln!(out, "Summary")?;
    for (label, count) in summary.lines() {
        writeln!(out, "  {label}: {count}")?;
    }
    writeln!(out)?;
    writeln!(out, "CSV: {}", csv_path.display())?;
    Ok(out)
}

pub fn write_log(
    path: &Path,
    records: &[DocumentRecord],
    summary: &RunSummary,
    context: &RunContext<'_>,
    csv_path: &Path,
) -> Result<(), ReportError> {
    let text = render(records, summary, context, csv_path)
        .map_err(|e| ReportError::Io(std::io::Error::other(e)))?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    fn rendered() -> String {
        let records = fixtures::records();
        let summary = RunSummary::from_records(&records);
        let context = RunContext {
            root: Path::new("/cases"),
            started: fixtures::started(),
        };
        render(&records, &summary, &context, Path::new("logs/x.csv")).unwrap()
    }

    #[test]
    fn header_names_root_and_count() {
        let log = rendered();
        assert!(log.starts_with("Case file audit - 20250314_092653\n"));
        assert!(log.contains("Root folder: /cases\n"));
        assert!(log.contains("Case files found: 3\n"));
    }

    #[test]
    fn each_record_lists_sections_and_observations() {
        let log = rendered();
        assert!(log.contains("Case file: /cases/A-000001-2025.pdf\n"));
        assert!(log.contains("  - Carátula detected / complete: yes / yes\n"));
        assert!(log.contains("  - CUILs: GLOBAL:20111222224, ANSES:20111222224\n"));
        assert!(log.contains("      * ANSES not found.\n"));
        assert!(log.contains("  - Read error: yes\n"));
        assert!(log.contains("  - Coherent CUIL: n/a\n"));
    }

    #[test]
    fn summary_comes_last() {
        let log = rendered();
        let summary_at = log.find("Summary\n").unwrap();
        assert!(log[summary_at..].contains("  Read errors: 1\n"));
        assert!(log[summary_at..].contains("  Coherent CUIL: 1\n"));
        assert!(log.trim_end().ends_with("CSV: logs/x.csv"));
    }
}
