//! YAML run files
//!
//! A run file fixes everything a `run` or `compare` invocation needs; any
//! field left out takes its default, and command-line flags win over the
//! file.
//!
//! ```yaml
//! engine:
//!   max_risk: 0.5
//! cohort:
//!   n_patients: 250
//!   risk_distribution:
//!     diabetes: 0.2
//! simulation:
//!   threshold_key: mdr_pmcf
//!   n_iterations: 10000
//!   seed: 42
//! scenarios:
//!   - name: reference
//!   - name: no smokers
//!     exclusions: [smoking]
//! ```

use std::path::Path;

use color_eyre::eyre::{WrapErr, eyre};
use revsim_core::cohort::{Prevalence, default_prevalence};
use revsim_core::config::{EngineConfig, ThresholdKey};
use revsim_core::scenario::{ComparisonRequest, ScenarioSpec};
use revsim_core::simulation::SimulationRequest;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PATIENTS: usize = 200;
pub const DEFAULT_ITERATIONS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortSection {
    pub n_patients: usize,
    pub risk_distribution: Option<Prevalence>,
}

impl Default for CohortSection {
    fn default() -> Self {
        Self {
            n_patients: DEFAULT_PATIENTS,
            risk_distribution: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub threshold_key: String,
    pub n_iterations: usize,
    pub seed: Option<u64>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            threshold_key: ThresholdKey::default().key().to_string(),
            n_iterations: DEFAULT_ITERATIONS,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunFile {
    pub engine: EngineConfig,
    pub cohort: CohortSection,
    pub simulation: SimulationSection,
    pub scenarios: Vec<ScenarioSpec>,
}

/// Values given on the command line; `None` keeps the run file's value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub n_patients: Option<usize>,
    pub n_iterations: Option<usize>,
    pub threshold_key: Option<String>,
    pub seed: Option<u64>,
    pub prevalence: Vec<(String, f64)>,
}

impl RunFile {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read run file {}", path.display()))?;
        Self::from_yaml(&content)
            .map_err(|e| eyre!("failed to parse run file {}: {e}", path.display()))
    }

    /// Load `path` if given, otherwise start from defaults
    pub fn load_or_default(path: Option<&Path>) -> color_eyre::Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Lay command-line values over the file. Prevalence pairs extend the
    /// file's map, or the default table when the file has none.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(n) = overrides.n_patients {
            self.cohort.n_patients = n;
        }
        if let Some(n) = overrides.n_iterations {
            self.simulation.n_iterations = n;
        }
        if let Some(key) = &overrides.threshold_key {
            self.simulation.threshold_key.clone_from(key);
        }
        if overrides.seed.is_some() {
            self.simulation.seed = overrides.seed;
        }
        if !overrides.prevalence.is_empty() {
            self.cohort
                .risk_distribution
                .get_or_insert_with(default_prevalence)
                .extend(overrides.prevalence.iter().cloned());
        }
    }

    pub fn simulation_request(&self) -> SimulationRequest {
        SimulationRequest {
            n_patients: self.cohort.n_patients,
            risk_distribution: self.cohort.risk_distribution.clone(),
            threshold_key: self.simulation.threshold_key.clone(),
            n_iterations: self.simulation.n_iterations,
            seed: self.simulation.seed,
        }
    }

    pub fn comparison_request(&self) -> ComparisonRequest {
        ComparisonRequest {
            scenarios: self.scenarios.clone(),
            n_patients: self.cohort.n_patients,
            threshold_key: self.simulation.threshold_key.clone(),
            n_iterations: self.simulation.n_iterations,
            seed: self.simulation.seed,
        }
    }
}

/// Parse a `factor=prevalence` pair from the command line
pub fn parse_prevalence(arg: &str) -> Result<(String, f64), String> {
    let (factor, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected FACTOR=PREVALENCE, got '{arg}'"))?;
    let factor = factor.trim();
    if factor.is_empty() {
        return Err(format!("missing factor name in '{arg}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid prevalence in '{arg}': {e}"))?;
    Ok((factor.to_string(), value))
}
