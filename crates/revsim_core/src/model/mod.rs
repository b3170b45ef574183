mod hazard;
mod patient;
mod results;

pub use hazard::{
    CI95_WIDTH_IN_SD, HazardRatioSampler, HazardRatioSpec, HazardSample, MAX_SAMPLE_RETRIES,
};
pub use patient::{PatientRiskProfile, patient_id};
pub use results::{
    HIGH_CONFIDENCE_CUTOFF, MonteCarloSummary, ScenarioComparison, SimulationReport,
    SimulationResult, UNCERTAIN_CUTOFF, VarianceContributions, Verdict,
};
