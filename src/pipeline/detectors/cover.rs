//! Cover page: the "solicita jubilación ordinaria" heading.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DocumentRecord, Section};
use crate::pipeline::extraction::CaseText;

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)solicita\s+jubilaci[oó]n\s+ordinaria").unwrap());

pub fn detect(record: &mut DocumentRecord, text: &CaseText) {
    if !ANCHOR.is_match(text.full()) {
        record.observe(format!("{} not found.", Section::Cover.label()));
        return;
    }

    let status = record.section_mut(Section::Cover);
    status.detected = true;
    status.complete = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(pages: &[&str]) -> DocumentRecord {
        let mut record = DocumentRecord::new("a.pdf");
        let text = CaseText::from_pages(pages.iter().map(|s| s.to_string()).collect());
        detect(&mut record, &text);
        record
    }

    #[test]
    fn accent_and_spacing_variants_match() {
        for page in [
            "SOLICITA JUBILACIÓN ORDINARIA",
            "solicita  jubilacion\nordinaria",
            "Solicita Jubilación Ordinaria",
        ] {
            let record = run(&[page]);
            assert!(record.cover.detected, "{page}");
            assert!(record.cover.complete);
        }
    }

    #[test]
    fn missing_phrase_is_observed() {
        let record = run(&["solicita pension"]);
        assert!(!record.cover.detected);
        assert_eq!(record.observations().len(), 1);
        assert!(record.observations()[0].contains("Carátula"));
    }
}
