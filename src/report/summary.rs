//! Aggregate counters over a run.

use serde::Serialize;

use crate::models::{Consistency, DocumentRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub documents: usize,
    pub read_errors: usize,
    pub cover: usize,
    pub intake_form: usize,
    pub renaper_detected: usize,
    pub renaper_complete: usize,
    pub sintys_detected: usize,
    pub sintys_ok: usize,
    pub intercajas_detected: usize,
    pub intercajas_ok: usize,
    pub anses_detected: usize,
    pub anses_complete: usize,
    pub negative_detected: usize,
    pub negative_ok: usize,
    pub both_photos: usize,
    pub any_cuil: usize,
    pub coherent_cuil: usize,
}

impl RunSummary {
    pub fn from_records(records: &[DocumentRecord]) -> Self {
        let mut summary = Self {
            documents: records.len(),
            ..Self::default()
        };
        for r in records {
            summary.read_errors += usize::from(r.read_error);
            summary.cover += usize::from(r.cover.detected);
            summary.intake_form += usize::from(r.intake_form.detected);
            summary.renaper_detected += usize::from(r.renaper.detected);
            summary.renaper_complete += usize::from(r.renaper.complete);
            summary.sintys_detected += usize::from(r.sintys.detected);
            summary.sintys_ok += usize::from(r.sintys.complete);
            summary.intercajas_detected += usize::from(r.intercajas.detected);
            summary.intercajas_ok += usize::from(r.intercajas.complete);
            summary.anses_detected += usize::from(r.anses.detected);
            summary.anses_complete += usize::from(r.anses.complete);
            summary.negative_detected += usize::from(r.negative_certification.detected);
            summary.negative_ok += usize::from(r.negative_certification.complete);
            summary.both_photos += usize::from(r.both_photos());
            summary.any_cuil += usize::from(!r.identity_numbers().is_empty());
            summary.coherent_cuil += usize::from(r.consistency() == Consistency::Coherent);
        }
        summary
    }

    /// Labelled counters in report order.
    pub fn lines(&self) -> [(&'static str, usize); 16] {
        [
            ("Read errors", self.read_errors),
            ("Cover", self.cover),
            ("Intake form", self.intake_form),
            ("RENAPER detected", self.renaper_detected),
            ("RENAPER complete", self.renaper_complete),
            ("SINTyS detected", self.sintys_detected),
            ("SINTyS ok", self.sintys_ok),
            ("Intercajas detected", self.intercajas_detected),
            ("Intercajas ok", self.intercajas_ok),
            ("ANSES detected", self.anses_detected),
            ("ANSES complete", self.anses_complete),
            ("Negative certification detected", self.negative_detected),
            ("Negative certification ok", self.negative_ok),
            ("Both ID photos", self.both_photos),
            ("Any CUIL", self.any_cuil),
            ("Coherent CUIL", self.coherent_cuil),
        ]
    }
}
