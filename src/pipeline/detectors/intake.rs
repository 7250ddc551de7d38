//! Intake form: "formulario de inicio". The applicant CUIL is taken from
//! the whole document, since the form is usually the first page to print it.

use std::sync::LazyLock;

use regex::Regex;

use super::register_or_observe;
use crate::models::{DocumentRecord, Origin, Section};
use crate::pipeline::extraction::CaseText;
use crate::pipeline::identity;

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)formulario\s+de\s+inicio").unwrap());

pub fn detect(record: &mut DocumentRecord, text: &CaseText) {
    if !ANCHOR.is_match(text.full()) {
        record.observe(format!("{} not found.", Section::IntakeForm.label()));
        return;
    }

    let status = record.section_mut(Section::IntakeForm);
    status.detected = true;
    status.complete = true;

    let number = identity::extract(text.full());
    register_or_observe(record, Origin::Form, Section::IntakeForm, number);
}
