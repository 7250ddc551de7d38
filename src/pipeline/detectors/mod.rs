//! Section detectors.
//!
//! One plain function per required sub-report, all sharing the
//! [`SectionDetector`] signature and run in the fixed order of [`DETECTORS`].
//! Each detector searches its anchor phrase, sets the detected flag, applies
//! its completeness heuristic and registers the CUIL it finds under its own
//! origin tag. Every failure leaves exactly one observation on the record.

pub mod anses;
pub mod cover;
pub mod intake;
pub mod intercajas;
pub mod negative;
pub mod renaper;
pub mod sintys;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::{DocumentRecord, Origin, Section};
use crate::pipeline::extraction::CaseText;
use crate::pipeline::identity;

/// Uniform detector signature.
pub type SectionDetector = fn(&mut DocumentRecord, &CaseText);

/// Detectors in execution order.
pub const DETECTORS: [(Section, SectionDetector); 7] = [
    (Section::Cover, cover::detect),
    (Section::IntakeForm, intake::detect),
    (Section::Renaper, renaper::detect),
    (Section::Sintys, sintys::detect),
    (Section::Intercajas, intercajas::detect),
    (Section::Anses, anses::detect),
    (Section::NegativeCertification, negative::detect),
];

/// Lines after an anchor that may carry the section's CUIL.
pub const HEADER_LINES: usize = 6;

static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

// A labelled CUIL; the digit group never crosses a line break.
static LABELLED_CUIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcuil\s*:?\s*([0-9][0-9 \t-]{9,})").unwrap());

/// Run every detector over `text` in order.
pub fn run_all(record: &mut DocumentRecord, text: &CaseText) {
    for (section, detect) in DETECTORS {
        detect(record, text);
        let status = record.section(section);
        debug!(
            path = %record.path().display(),
            section = section.as_str(),
            detected = status.detected,
            complete = status.complete,
            "Section evaluated"
        );
    }
}

/// Text from `start` up to the next blank line, or to the end of `text`.
pub(crate) fn isolate_block(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    match BLANK_LINE.find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    }
}

/// The first `n` lines of `text`.
pub(crate) fn header_lines(text: &str, n: usize) -> String {
    text.lines().take(n).collect::<Vec<_>>().join("\n")
}

/// First `CUIL:`-labelled number in `excerpt` that yields a CUIL.
pub(crate) fn labelled_cuil(excerpt: &str) -> Option<String> {
    LABELLED_CUIL
        .captures_iter(excerpt)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| identity::extract(m.as_str()))
}

/// Register `number` under `origin`, or note that the section had none.
pub(crate) fn register_or_observe(
    record: &mut DocumentRecord,
    origin: Origin,
    section: Section,
    number: Option<String>,
) {
    match number {
        Some(cuil) => record.register_identity(origin, &cuil),
        None => record.observe(format!(
            "{} present, but no CUIL could be extracted.",
            section.label()
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_stops_at_blank_line() {
        let text = "INFORME\nlinea 1\nlinea 2\n\notro bloque";
        assert_eq!(isolate_block(text, 7), "\nlinea 1\nlinea 2");
    }

    #[test]
    fn block_runs_to_end_without_blank_line() {
        let text = "INFORME\nlinea 1";
        assert_eq!(isolate_block(text, 0), "INFORME\nlinea 1");
    }

    #[test]
    fn header_keeps_first_lines() {
        assert_eq!(header_lines("a\nb\nc\nd", 2), "a\nb");
    }

    #[test]
    fn labelled_cuil_accepts_label_variants() {
        assert_eq!(labelled_cuil("CUIL: 20-11122222-4").as_deref(), Some(fixtures::CUIL));
        assert_eq!(labelled_cuil("cuil 20 11122222 4").as_deref(), Some(fixtures::CUIL));
        assert_eq!(labelled_cuil("CUIL:\n20111222224").as_deref(), Some(fixtures::CUIL));
    }

    #[test]
    fn labelled_cuil_does_not_fuse_next_line() {
        let excerpt = "CUIL: 20-11122222-4\n12 345";
        assert_eq!(labelled_cuil(excerpt).as_deref(), Some(fixtures::CUIL));
    }

    #[test]
    fn labelled_cuil_skips_unusable_label() {
        let excerpt = "CUIL ingresado\nCUIL: 20111222224";
        assert_eq!(labelled_cuil(excerpt).as_deref(), Some(fixtures::CUIL));
    }

    #[test]
    fn all_detectors_on_complete_document() {
        let text = CaseText::from_pages(fixtures::complete_pages());
        let mut record = DocumentRecord::new("E-000123-2025.pdf");
        run_all(&mut record, &text);

        for section in Section::ALL {
            let status = record.section(section);
            assert!(status.detected, "{section} not detected");
            assert!(status.complete, "{section} not complete");
        }
        assert!(record.observations().is_empty(), "{:?}", record.observations());
        assert_eq!(record.identity_numbers().distinct_values().len(), 1);
        assert_eq!(record.national_id.as_deref(), Some("11122222"));
    }

    #[test]
    fn every_detector_is_idempotent_on_fresh_records() {
        let text = CaseText::from_pages(vec![
            "SOLICITA JUBILACION ORDINARIA".into(),
            "INFORME - ANSES\nNO CONSULTADO".into(),
            "hoja final".into(),
        ]);
        for (section, detect) in DETECTORS {
            let mut first = DocumentRecord::new("a.pdf");
            let mut second = DocumentRecord::new("a.pdf");
            detect(&mut first, &text);
            detect(&mut second, &text);
            assert_eq!(first.section(section), second.section(section));
            assert_eq!(first.observations(), second.observations());
        }
    }

    #[test]
    fn every_missing_section_is_observed() {
        let text = CaseText::from_pages(vec!["pagina sin contenido relevante".into()]);
        for (section, detect) in DETECTORS {
            let mut record = DocumentRecord::new("a.pdf");
            detect(&mut record, &text);
            assert!(!record.section(section).detected);
            assert_eq!(record.observations().len(), 1, "{section}");
        }
    }
}
