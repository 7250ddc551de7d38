//! RENAPER identity-registry report.
//!
//! Complete only when every mandatory field is printed; the check is binary.
//! The report attests the DNI but carries no CUIL.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DocumentRecord, Section};
use crate::pipeline::extraction::CaseText;

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(consulta|informe)\s+renaper").unwrap());

static DNI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bdni\s*:\s*(\d+)").unwrap());

static MANDATORY_FIELDS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("DNI", Regex::new(r"(?i)\bdni\s*:\s*\d+").unwrap()),
        ("SEXO", Regex::new(r"(?i)\bsexo\s*:\s*[fmox]\b").unwrap()),
        ("FECHA CONSULTA", Regex::new(r"(?i)fecha\s+consulta\s*:").unwrap()),
        (
            "DATOS REGISTRADOS EN EL RENAPER",
            Regex::new(r"(?i)datos\s+registrados\s+en\s+el\s+renaper").unwrap(),
        ),
    ]
});

/// Whether `text` carries the RENAPER report heading.
pub fn mentions_report(text: &str) -> bool {
    ANCHOR.is_match(text)
}

/// Mandatory fields absent from `text`.
pub fn missing_fields(text: &str) -> Vec<&'static str> {
    MANDATORY_FIELDS
        .iter()
        .filter(|(_, pattern)| !pattern.is_match(text))
        .map(|(name, _)| *name)
        .collect()
}

pub fn detect(record: &mut DocumentRecord, text: &CaseText) {
    let full = text.full();
    if !mentions_report(full) {
        record.observe(format!("{} report not found.", Section::Renaper.label()));
        return;
    }

    record.renaper.detected = true;

    let missing = missing_fields(full);
    if missing.is_empty() {
        record.renaper.complete = true;
    } else {
        record.observe(format!(
            "{} report incomplete, missing: {}.",
            Section::Renaper.label(),
            missing.join(", ")
        ));
    }

    record.national_id = DNI
        .captures(full)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
}
