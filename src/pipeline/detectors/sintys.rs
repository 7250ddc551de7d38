//! SINTyS cross-check report.
//!
//! Clean when both the disability and the death sections carry their
//! "sin datos" legend. A family-relations section without its legend is
//! noted but does not fail the report.

use std::sync::LazyLock;

use regex::Regex;

use super::{header_lines, labelled_cuil, register_or_observe, HEADER_LINES};
use crate::models::{DocumentRecord, Origin, Section};
use crate::pipeline::extraction::CaseText;

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(consulta\s+sintys|persona\s+identificada)").unwrap());

/// (section heading, legend that must accompany it)
const REQUIRED: [(&str, &str); 2] = [
    ("INVALIDEZ", "SIN DATOS DE DISCAPACIDAD"),
    ("FALLECIDO", "SIN DATOS DE FALLECIMIENTO"),
];

const FAMILY: (&str, &str) = ("RELACIONES FAMILIARES", "SIN DATOS DE FAMILIARES");

pub fn detect(record: &mut DocumentRecord, text: &CaseText) {
    let full = text.full();
    let Some(anchor) = ANCHOR.find(full) else {
        record.observe(format!("{} report not found.", Section::Sintys.label()));
        return;
    };

    record.sintys.detected = true;
    let upper = full.to_uppercase();
    let label = Section::Sintys.label();

    let mut clean = true;
    for (heading, legend) in REQUIRED {
        if !upper.contains(heading) {
            record.observe(format!("{label} report: missing section '{heading}'."));
            clean = false;
        } else if !upper.contains(legend) {
            record.observe(format!("{label} report: '{heading}' without '{legend}'."));
            clean = false;
        }
    }

    let (heading, legend) = FAMILY;
    if upper.contains(heading) && !upper.contains(legend) {
        record.observe(format!("{label} report: '{heading}' without '{legend}'."));
    }

    let header = header_lines(&full[anchor.start()..], HEADER_LINES);
    register_or_observe(record, Origin::Sintys, Section::Sintys, labelled_cuil(&header));

    record.sintys.complete = clean;
}
