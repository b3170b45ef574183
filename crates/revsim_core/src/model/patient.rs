use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A synthetic patient: which named risk factors are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRiskProfile {
    pub id: String,
    pub risk_factors: BTreeMap<String, bool>,
    /// Baseline probability the patient was generated with. The engine draws
    /// a fresh baseline every iteration and does not read this field.
    pub base_revision_probability: f64,
}

impl PatientRiskProfile {
    #[must_use]
    pub fn has(&self, factor: &str) -> bool {
        self.risk_factors.get(factor).copied().unwrap_or(false)
    }

    /// Names of the factors present for this patient, in name order
    pub fn present_factors(&self) -> impl Iterator<Item = &str> {
        self.risk_factors
            .iter()
            .filter(|(_, present)| **present)
            .map(|(factor, _)| factor.as_str())
    }
}

/// Format the synthetic identifier for the patient at `index` (zero-based)
#[must_use]
pub fn patient_id(index: usize) -> String {
    format!("SIM-{:04}", index + 1)
}
