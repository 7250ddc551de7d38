//! Per-document validation orchestrator.
//!
//! Single entry point that drives one case file through:
//! read text → GLOBAL CUIL → section detectors → photo evidence → consistency.
//!
//! Uses trait-based DI for the document reader and the photo stages, so the
//! orchestrator stays fully testable with mock implementations.

use std::path::Path;

use tracing::{info, warn};

use crate::models::{DocumentRecord, Origin};
use crate::pipeline::extraction::{CaseText, DocumentReader};
use crate::pipeline::photo::PhotoEvidencePipeline;
use crate::pipeline::{consistency, detectors, identity};

pub struct ValidationOrchestrator {
    reader: Box<dyn DocumentReader>,
    photos: PhotoEvidencePipeline,
}

impl ValidationOrchestrator {
    pub fn new(reader: Box<dyn DocumentReader>, photos: PhotoEvidencePipeline) -> Self {
        Self { reader, photos }
    }

    /// Validate one case file. Never fails: problems end up as flags and
    /// observations on the returned record.
    ///
    /// A document whose text cannot be read stops right after the read-error
    /// flag is set; its consistency verdict stays unevaluated.
    pub fn validate(&self, path: &Path) -> DocumentRecord {
        let mut record = DocumentRecord::new(path);

        let pages = match self.reader.page_texts(path) {
            Ok(pages) => pages,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read case file");
                record.read_error = true;
                record.observe(format!("Could not read document: {e}"));
                return record;
            }
        };
        let text = CaseText::from_pages(pages);

        if let Some(number) = identity::extract(text.full()) {
            record.register_identity(Origin::Global, &number);
        }

        detectors::run_all(&mut record, &text);

        let photos = self.photos.evaluate(&mut record, &text, self.reader.as_ref());

        let verdict = consistency::evaluate(&mut record);

        info!(
            path = %path.display(),
            pages = text.page_count(),
            photos = photos.evidence.len(),
            verdict = ?verdict,
            observations = record.observations().len(),
            "Case file validated"
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhotoConfig;
    use crate::models::{Consistency, Section};
    use crate::pipeline::detectors::fixtures;
    use crate::pipeline::extraction::MockDocumentReader;
    use crate::pipeline::photo::{fixtures as photos, NoOpOrientationDetector, NullArtifactStore};

    fn orchestrator(reader: MockDocumentReader) -> ValidationOrchestrator {
        ValidationOrchestrator::new(
            Box::new(reader),
            PhotoEvidencePipeline::new(
                Box::new(NoOpOrientationDetector),
                Box::new(NullArtifactStore),
                PhotoConfig::default(),
            ),
        )
    }

    /// RENAPER is page 2, so the photo window is pages 0 and 1.
    fn complete_reader(pages: Vec<String>) -> MockDocumentReader {
        MockDocumentReader::new(pages)
            .with_image(0, photos::front_card())
            .with_image(1, photos::back_card())
    }

    #[test]
    fn complete_case_file_sets_every_flag() {
        let pages = fixtures::complete_pages();
        let record = orchestrator(complete_reader(pages)).validate(Path::new("E-000123-2025.pdf"));

        for section in Section::ALL {
            let status = record.section(section);
            assert!(status.detected && status.complete, "{section}");
        }
        assert!(record.front_photo && record.back_photo);
        assert!(!record.read_error);
        assert_eq!(record.consistency(), Consistency::Coherent);
        assert_eq!(
            record.identity_numbers().get(Origin::Global),
            Some(fixtures::CUIL)
        );
        assert_eq!(record.identity_numbers().len(), 6);
        assert!(record.observations().is_empty(), "{:?}", record.observations());
    }

    #[test]
    fn disagreeing_certificate_is_incoherent() {
        let mut pages = fixtures::complete_pages();
        let last = pages.len() - 1;
        pages[last] = fixtures::NEGATIVE.replace("20 11122222 4", "27-11122222-9");

        let record = orchestrator(complete_reader(pages)).validate(Path::new("E-000123-2025.pdf"));

        assert_eq!(record.consistency(), Consistency::Incoherent);
        assert_eq!(record.observations().len(), 1);
        let observation = &record.observations()[0];
        assert!(observation.contains("NEGATIVA:27111222229"), "{observation}");
        assert!(observation.contains("ANSES:20111222224"), "{observation}");
    }

    #[test]
    fn unreadable_document_stops_early() {
        let record = orchestrator(MockDocumentReader::failing()).validate(Path::new("E-000001-2025.pdf"));

        assert!(record.read_error);
        assert_eq!(record.observations().len(), 1);
        assert!(record.observations()[0].contains("Could not read document"));
        assert_eq!(record.consistency(), Consistency::Unevaluated);
        assert!(record.identity_numbers().is_empty());
        assert!(!record.cover.detected);
    }

    #[test]
    fn empty_document_is_incoherent_with_observations() {
        let record = orchestrator(MockDocumentReader::new(Vec::new())).validate(Path::new("E-000002-2025.pdf"));

        assert!(!record.read_error);
        assert_eq!(record.consistency(), Consistency::Incoherent);
        // seven detectors, the photo tally and the consistency check
        assert_eq!(record.observations().len(), 9);
    }
}
