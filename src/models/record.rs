//! Per-case result aggregate.
//!
//! A `DocumentRecord` is created when a case file starts processing, mutated
//! by the detectors, the photo pipeline and the consistency checker during
//! that single pass, then handed read-only to reporting.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::enums::{Origin, Section};
use crate::pipeline::identity;

/// Detected / complete pair for one required sub-report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
    pub detected: bool,
    pub complete: bool,
}

/// Tri-state CUIL consistency verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    #[default]
    Unevaluated,
    Coherent,
    Incoherent,
}

/// Outcome of registering a number under an origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// Same value already present for the origin.
    Unchanged,
    /// A different value was already present; the first one is kept.
    Conflict { kept: String },
}

/// Origin tag → CUIL. One value per origin, first extraction wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdentityRegistry {
    entries: BTreeMap<Origin, String>,
}

impl IdentityRegistry {
    pub fn register(&mut self, origin: Origin, number: &str) -> Registration {
        match self.entries.get(&origin) {
            Some(existing) if existing == number => Registration::Unchanged,
            Some(existing) => Registration::Conflict {
                kept: existing.clone(),
            },
            None => {
                self.entries.insert(origin, number.to_string());
                Registration::Inserted
            }
        }
    }

    pub fn get(&self, origin: Origin) -> Option<&str> {
        self.entries.get(&origin).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Origin, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Distinct non-empty values across all origins.
    pub fn distinct_values(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// `ORIGIN:value` pairs joined with `separator`.
    pub fn describe(&self, separator: &str) -> String {
        self.iter()
            .map(|(origin, value)| format!("{origin}:{value}"))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub path: PathBuf,

    pub cover: SectionStatus,
    pub intake_form: SectionStatus,
    pub renaper: SectionStatus,
    pub sintys: SectionStatus,
    pub intercajas: SectionStatus,
    pub anses: SectionStatus,
    pub negative_certification: SectionStatus,

    pub front_photo: bool,
    pub back_photo: bool,

    pub read_error: bool,

    /// DNI attested by the RENAPER report, when present.
    pub national_id: Option<String>,

    identity_numbers: IdentityRegistry,
    consistency: Consistency,
    observations: Vec<String>,
}

impl DocumentRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cover: SectionStatus::default(),
            intake_form: SectionStatus::default(),
            renaper: SectionStatus::default(),
            sintys: SectionStatus::default(),
            intercajas: SectionStatus::default(),
            anses: SectionStatus::default(),
            negative_certification: SectionStatus::default(),
            front_photo: false,
            back_photo: false,
            read_error: false,
            national_id: None,
            identity_numbers: IdentityRegistry::default(),
            consistency: Consistency::Unevaluated,
            observations: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem used to name persisted artifacts.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    pub fn section(&self, section: Section) -> SectionStatus {
        match section {
            Section::Cover => self.cover,
            Section::IntakeForm => self.intake_form,
            Section::Renaper => self.renaper,
            Section::Sintys => self.sintys,
            Section::Intercajas => self.intercajas,
            Section::Anses => self.anses,
            Section::NegativeCertification => self.negative_certification,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut SectionStatus {
        match section {
            Section::Cover => &mut self.cover,
            Section::IntakeForm => &mut self.intake_form,
            Section::Renaper => &mut self.renaper,
            Section::Sintys => &mut self.sintys,
            Section::Intercajas => &mut self.intercajas,
            Section::Anses => &mut self.anses,
            Section::NegativeCertification => &mut self.negative_certification,
        }
    }

    pub fn both_photos(&self) -> bool {
        self.front_photo && self.back_photo
    }

    // ── Observations ──────────────────────────────────────

    pub fn observe(&mut self, message: impl Into<String>) {
        self.observations.push(message.into());
    }

    pub fn observations(&self) -> &[String] {
        &self.observations
    }

    // ── CUIL registry ─────────────────────────────────────

    /// Register a CUIL under `origin`.
    ///
    /// Empty input is ignored. A different value at an already-populated
    /// origin is reported and the first value kept. A failing check digit
    /// is reported but the number is still registered.
    pub fn register_identity(&mut self, origin: Origin, number: &str) {
        if number.is_empty() {
            return;
        }

        if let Registration::Conflict { kept } = self.identity_numbers.register(origin, number) {
            self.observe(format!(
                "Different CUIL re-extracted at {origin}: {kept} -> {number} (keeping {kept})."
            ));
        }

        if !identity::validate(number) {
            self.observe(format!("CUIL with invalid check digit: {number}."));
        }
    }

    pub fn identity_numbers(&self) -> &IdentityRegistry {
        &self.identity_numbers
    }

    pub fn consistency(&self) -> Consistency {
        self.consistency
    }

    /// Set the verdict. Only the first call has an effect.
    pub fn set_consistency(&mut self, verdict: Consistency) -> bool {
        if self.consistency != Consistency::Unevaluated || verdict == Consistency::Unevaluated {
            return false;
        }
        self.consistency = verdict;
        true
    }
}
