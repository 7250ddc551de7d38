//! ANSES social-security report.
//!
//! Incomplete when the isolated block is dominated by "no consultado" or
//! "sin información" markers. The CUIL is read from the block header only, so
//! family members listed further down are never picked up.

use std::sync::LazyLock;

use regex::Regex;

use super::{header_lines, isolate_block, labelled_cuil, register_or_observe, HEADER_LINES};
use crate::models::{DocumentRecord, Origin, Section};
use crate::pipeline::extraction::CaseText;

/// Either marker reaching this count makes the report incomplete.
pub const INCOMPLETE_THRESHOLD: usize = 7;

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)informe\s*-\s*anses").unwrap());

static NOT_CONSULTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bno\s+consultado\b").unwrap());

static NO_INFORMATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsin\s+informaci[óo]n\b").unwrap());

/// Marker counts within one block: (not consulted, no information).
pub fn marker_counts(block: &str) -> (usize, usize) {
    (
        NOT_CONSULTED.find_iter(block).count(),
        NO_INFORMATION.find_iter(block).count(),
    )
}

pub fn detect(record: &mut DocumentRecord, text: &CaseText) {
    let full = text.full();
    let Some(anchor) = ANCHOR.find(full) else {
        record.observe(format!("{} report not found.", Section::Anses.label()));
        return;
    };

    record.anses.detected = true;

    let block = isolate_block(full, anchor.end());
    let (not_consulted, no_information) = marker_counts(block);

    if not_consulted >= INCOMPLETE_THRESHOLD || no_information >= INCOMPLETE_THRESHOLD {
        record.observe(format!(
            "{} report incomplete: {not_consulted}x 'NO CONSULTADO' / {no_information}x 'SIN INFORMACIÓN'.",
            Section::Anses.label()
        ));
    } else {
        record.anses.complete = true;
    }

    let header = header_lines(block, HEADER_LINES);
    register_or_observe(record, Origin::Anses, Section::Anses, labelled_cuil(&header));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::detectors::fixtures;

    fn run(page: &str) -> DocumentRecord {
        let mut record = DocumentRecord::new("a.pdf");
        detect(&mut record, &CaseText::from_pages(vec![page.to_string()]));
        record
    }

    fn block_with(markers: usize, marker: &str) -> String {
        let mut page = fixtures::ANSES.to_string();
        for i in 0..markers {
            page.push_str(&format!("Organismo {i}: {marker}\n"));
        }
        page
    }

    #[test]
    fn six_not_consulted_is_complete() {
        let record = run(&block_with(6, "NO CONSULTADO"));
        assert!(record.anses.detected);
        assert!(record.anses.complete);
        assert!(record.observations().is_empty());
    }

    #[test]
    fn seven_not_consulted_is_incomplete() {
        let record = run(&block_with(7, "NO CONSULTADO"));
        assert!(record.anses.detected);
        assert!(!record.anses.complete);
        assert_eq!(record.observations().len(), 1);
        assert!(record.observations()[0].contains("7x 'NO CONSULTADO'"));
        assert!(record.observations()[0].contains("0x 'SIN INFORMACIÓN'"));
    }

    #[test]
    fn unaccented_no_information_counts() {
        let record = run(&block_with(7, "Sin Informacion"));
        assert!(!record.anses.complete);
    }

    #[test]
    fn markers_after_blank_line_are_outside_block() {
        let mut page = fixtures::ANSES.to_string();
        page.push('\n');
        for _ in 0..10 {
            page.push_str("NO CONSULTADO\n");
        }
        let record = run(&page);
        assert!(record.anses.complete);
    }

    #[test]
    fn header_cuil_is_registered() {
        let record = run(fixtures::ANSES);
        assert_eq!(
            record.identity_numbers().get(Origin::Anses),
            Some(fixtures::CUIL)
        );
    }

    #[test]
    fn cuil_below_header_is_not_registered() {
        let page = "INFORME - ANSES\n1\n2\n3\n4\n5\n6\nCUIL: 27111222229";
        let record = run(page);
        assert!(record.identity_numbers().is_empty());
        assert_eq!(record.observations().len(), 1);
        assert!(record.observations()[0].contains("no CUIL"));
    }
}
