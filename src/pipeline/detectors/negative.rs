//! Negative certification, always the last page of the case file.

use std::sync::LazyLock;

use regex::Regex;

use super::register_or_observe;
use crate::models::{DocumentRecord, Origin, Section};
use crate::pipeline::extraction::CaseText;
use crate::pipeline::identity;

/// Verification page the certificate must point to.
pub const VERIFICATION_URL: &str = "servicioswww.anses.gob.ar/censite/Antecedentes.aspx";

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(certificaci[oó]n\s+negativa|servicioswww\.anses\.gob\.ar)").unwrap()
});

pub fn detect(record: &mut DocumentRecord, text: &CaseText) {
    let label = Section::NegativeCertification.label();
    let Some(last_page) = text.last_page() else {
        record.observe(format!("{label}: document has no last page to inspect."));
        return;
    };

    if !ANCHOR.is_match(last_page) {
        record.observe(format!("{label} not found on the last page."));
        return;
    }

    record.negative_certification.detected = true;

    if last_page
        .to_lowercase()
        .contains(&VERIFICATION_URL.to_lowercase())
    {
        record.negative_certification.complete = true;
    } else {
        record.observe(format!("{label}: verification URL '{VERIFICATION_URL}' not found."));
    }

    register_or_observe(
        record,
        Origin::Negative,
        Section::NegativeCertification,
        identity::extract(last_page),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::detectors::fixtures;

    fn run(pages: Vec<String>) -> DocumentRecord {
        let mut record = DocumentRecord::new("a.pdf");
        detect(&mut record, &CaseText::from_pages(pages));
        record
    }

    #[test]
    fn certificate_with_url_is_complete() {
        let record = run(vec!["caratula".into(), fixtures::NEGATIVE.into()]);
        assert!(record.negative_certification.detected);
        assert!(record.negative_certification.complete);
        assert_eq!(
            record.identity_numbers().get(Origin::Negative),
            Some(fixtures::CUIL)
        );
        assert!(record.observations().is_empty());
    }

    #[test]
    fn date_line_above_cuil_does_not_hide_it() {
        let page = "CERTIFICACIÓN NEGATIVA\nEmitido el 01/03/2025\n20-11122222-4\n\
            servicioswww.anses.gob.ar/censite/Antecedentes.aspx";
        let record = run(vec![page.into()]);
        assert!(record.negative_certification.complete);
        assert_eq!(
            record.identity_numbers().get(Origin::Negative),
            Some(fixtures::CUIL)
        );
        assert!(record.observations().is_empty(), "{:?}", record.observations());
    }

    #[test]
    fn url_match_is_case_insensitive() {
        let page = "Certificacion Negativa CUIL 20111222224\nSERVICIOSWWW.ANSES.GOB.AR/CENSITE/ANTECEDENTES.ASPX";
        let record = run(vec![page.into()]);
        assert!(record.negative_certification.complete);
    }

    #[test]
    fn certificate_on_earlier_page_is_ignored() {
        let record = run(vec![fixtures::NEGATIVE.into(), "anexo".into()]);
        assert!(!record.negative_certification.detected);
        assert_eq!(record.observations().len(), 1);
    }

    #[test]
    fn missing_url_is_observed() {
        let record = run(vec!["CERTIFICACIÓN NEGATIVA\nCUIL 20111222224".into()]);
        assert!(record.negative_certification.detected);
        assert!(!record.negative_certification.complete);
        assert_eq!(record.observations().len(), 1);
    }

    #[test]
    fn empty_document_is_observed() {
        let record = run(Vec::new());
        assert!(!record.negative_certification.detected);
        assert_eq!(record.observations().len(), 1);
    }
}
