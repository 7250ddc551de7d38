//! Intercajas benefits cross-check ("certificación de condición previsional").

use std::sync::LazyLock;

use regex::Regex;

use super::{header_lines, labelled_cuil, register_or_observe, HEADER_LINES};
use crate::models::{DocumentRecord, Origin, Section};
use crate::pipeline::extraction::CaseText;

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(consulta\s+intercajas|certificaci[oó]n\s+de\s+condici[oó]n\s+previsional)")
        .unwrap()
});

static NO_BENEFITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)no\s+se\s+encontraron\s+beneficios\s+otorgados\s+con\s+el\s+cuil\s+ingresado")
        .unwrap()
});

pub fn detect(record: &mut DocumentRecord, text: &CaseText) {
    let full = text.full();
    let Some(anchor) = ANCHOR.find(full) else {
        record.observe(format!("{} report not found.", Section::Intercajas.label()));
        return;
    };

    record.intercajas.detected = true;

    if NO_BENEFITS.is_match(full) {
        record.intercajas.complete = true;
    } else {
        record.observe(format!(
            "{} report: missing 'No se encontraron beneficios otorgados con el CUIL ingresado'.",
            Section::Intercajas.label()
        ));
    }

    let header = header_lines(&full[anchor.start()..], HEADER_LINES);
    register_or_observe(
        record,
        Origin::Intercajas,
        Section::Intercajas,
        labelled_cuil(&header),
    );
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

    #[test]
    fn no_benefits_sentence_completes_report() {
        let record = run(fixtures::INTERCAJAS);
        assert!(record.intercajas.detected);
        assert!(record.intercajas.complete);
        assert_eq!(
            record.identity_numbers().get(Origin::Intercajas),
            Some(fixtures::CUIL)
        );
        assert!(record.observations().is_empty());
    }

    #[test]
    fn granted_benefit_leaves_report_incomplete() {
        let page = "CONSULTA INTERCAJAS\nCUIL 20111222224\nBeneficio 1234 otorgado";
        let record = run(page);
        assert!(record.intercajas.detected);
        assert!(!record.intercajas.complete);
        assert_eq!(record.observations().len(), 1);
    }

    #[test]
    fn unaccented_anchor_is_accepted() {
        let page = "CERTIFICACION DE CONDICION PREVISIONAL\nCUIL: 20111222224";
        assert!(run(page).intercajas.detected);
    }
}
