//! Implant revision-rate simulation library
//!
//! Estimates, by Monte Carlo simulation, the probability that a clinical
//! cohort's revision rate stays within a regulatory threshold while the
//! literature hazard ratios behind it remain uncertain. It provides:
//! - A hazard-ratio registry with a built-in fallback table
//! - Synthetic cohort generation from factor prevalences
//! - A seeded, single-threaded Monte Carlo engine with a per-patient risk cap
//! - Summary statistics, pass probability and verdicts
//! - R²-style variance attribution across uncertain inputs
//! - Multi-scenario comparison against a reference cohort
//!
//! ```ignore
//! use std::sync::Arc;
//! use revsim_core::{EngineConfig, HazardRatioRegistry, SimulationEngine, ThresholdKey};
//!
//! let registry = Arc::new(HazardRatioRegistry::with_defaults()?);
//! let engine = SimulationEngine::new(registry, EngineConfig::default())?;
//! let summary = engine.run_generated(200, None, ThresholdKey::Fda510k, 5_000, Some(42))?;
//! println!("{} ({:.1}%)", summary.verdict, summary.probability_pass * 100.0);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod cohort;
pub mod error;
pub mod registry;
pub mod scenario;
pub mod sensitivity;
pub mod simulation;
pub mod summary;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use cohort::{CohortGenerator, Prevalence, default_prevalence};
pub use config::{EngineConfig, ThresholdKey};
pub use error::{ConfigError, DataUnavailableError, InvalidParameterError, SimulationError};
pub use model::{
    HazardRatioSpec, MonteCarloSummary, PatientRiskProfile, ScenarioComparison,
    SimulationReport, SimulationResult, VarianceContributions, Verdict,
};
pub use registry::{HazardRatioRegistry, HazardRatioSource, StaticSource};
pub use scenario::{ComparisonRequest, ScenarioComparator, ScenarioSpec};
pub use sensitivity::SensitivityAnalyzer;
pub use simulation::{SimulationEngine, SimulationRequest, SimulationTrace};
pub use summary::{SummaryMetric, SummaryStatistics};
