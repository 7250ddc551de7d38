//! Cross-section CUIL consistency.

use tracing::debug;

use crate::models::{Consistency, DocumentRecord};

/// Settle the record's verdict from its identity registry.
///
/// Runs once, after every detector. An empty registry is incoherent: a case
/// file with no CUIL anywhere cannot be matched to an applicant.
pub fn evaluate(record: &mut DocumentRecord) -> Consistency {
    let registry = record.identity_numbers();
    let distinct = registry.distinct_values().len();

    let (verdict, observation) = match distinct {
        0 => (
            Consistency::Incoherent,
            Some("No CUIL found in any section.".to_string()),
        ),
        1 => (Consistency::Coherent, None),
        _ => (
            Consistency::Incoherent,
            Some(format!(
                "Inconsistent CUILs across sections: {}.",
                registry.describe(", ")
            )),
        ),
    };

    if let Some(message) = observation {
        record.observe(message);
    }
    record.set_consistency(verdict);

    debug!(
        path = %record.path().display(),
        distinct,
        verdict = ?verdict,
        "CUIL consistency evaluated"
    );
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;

    #[test]
    fn single_value_across_origins_is_coherent() {
        let mut record = DocumentRecord::new("a.pdf");
        record.register_identity(Origin::Anses, "20111222223");
        record.register_identity(Origin::Negative, "20111222223");
        let before = record.observations().len();

        assert_eq!(evaluate(&mut record), Consistency::Coherent);
        assert_eq!(record.consistency(), Consistency::Coherent);
        assert_eq!(record.observations().len(), before);
    }

    #[test]
    fn distinct_values_name_both_pairs() {
        let mut record = DocumentRecord::new("a.pdf");
        record.register_identity(Origin::Anses, "20111222223");
        record.register_identity(Origin::Negative, "27111222224");

        assert_eq!(evaluate(&mut record), Consistency::Incoherent);
        let last = record.observations().last().unwrap();
        assert!(last.contains("ANSES:20111222223"), "{last}");
        assert!(last.contains("NEGATIVA:27111222224"), "{last}");
    }

    #[test]
    fn empty_registry_is_incoherent() {
        let mut record = DocumentRecord::new("a.pdf");
        assert_eq!(evaluate(&mut record), Consistency::Incoherent);
        assert_eq!(record.observations().len(), 1);
        assert!(record.observations()[0].contains("No CUIL found"));
    }
}
