//! Integration tests for the revision-rate simulation engine
//!
//! Tests are organized by topic:
//! - `engine` - Core Monte Carlo mechanics, determinism and risk capping
//! - `requests` - Request validation and report assembly
//! - `scenarios` - Multi-scenario comparison and deltas
//! - `sensitivity` - Variance attribution on real traces

mod scenarios;
mod sensitivity;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::model::{HazardRatioSpec, PatientRiskProfile, patient_id};
use crate::registry::HazardRatioRegistry;
use crate::simulation::SimulationEngine;

fn default_engine() -> SimulationEngine {
    let registry = HazardRatioRegistry::with_defaults().expect("default table loads");
    SimulationEngine::new(Arc::new(registry), EngineConfig::default()).expect("default config")
}

fn engine_with(specs: Vec<HazardRatioSpec>) -> SimulationEngine {
    let registry = HazardRatioRegistry::from_specs(specs).expect("valid specs");
    SimulationEngine::new(Arc::new(registry), EngineConfig::default()).expect("default config")
}

/// `n` patients who all carry exactly `factors`
fn uniform_cohort(n: usize, factors: &[&str]) -> Vec<PatientRiskProfile> {
    (0..n)
        .map(|i| PatientRiskProfile {
            id: patient_id(i),
            risk_factors: factors
                .iter()
                .map(|f| (f.to_string(), true))
                .collect::<BTreeMap<_, _>>(),
            base_revision_probability: EngineConfig::default().baseline_mean(),
        })
        .collect()
}
