//! Engine calibration and regulatory thresholds
//!
//! The numeric defaults here are inherited calibration choices (baseline
//! `Beta(52, 948)`, 0.50 per-patient risk cap) and are kept exactly as-is.

use std::fmt;
use std::str::FromStr;

use rand_distr::Beta;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BASELINE_ALPHA: f64 = 52.0;
pub const DEFAULT_BASELINE_BETA: f64 = 948.0;
pub const DEFAULT_MAX_RISK: f64 = 0.50;

/// Accepted request ranges, enforced by `SimulationRequest::validate`
pub mod limits {
    pub const MIN_PATIENTS: usize = 10;
    pub const MAX_PATIENTS: usize = 10_000;
    pub const MIN_ITERATIONS: usize = 100;
    pub const MAX_ITERATIONS: usize = 100_000;
    pub const MAX_SCENARIOS: usize = 10;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Beta shape for the baseline revision probability
    pub baseline_alpha: f64,
    pub baseline_beta: f64,
    /// Ceiling on any single patient's revision probability
    pub max_risk: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_alpha: DEFAULT_BASELINE_ALPHA,
            baseline_beta: DEFAULT_BASELINE_BETA,
            max_risk: DEFAULT_MAX_RISK,
        }
    }
}

impl EngineConfig {
    /// Mean of the baseline Beta distribution
    #[must_use]
    pub fn baseline_mean(&self) -> f64 {
        self.baseline_alpha / (self.baseline_alpha + self.baseline_beta)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.baseline_distribution()?;
        if !(self.max_risk > 0.0 && self.max_risk <= 1.0) {
            return Err(ConfigError::InvalidRiskCap(self.max_risk));
        }
        Ok(())
    }

    pub(crate) fn baseline_distribution(&self) -> Result<Beta<f64>, ConfigError> {
        let invalid = |reason| ConfigError::InvalidBaseline {
            alpha: self.baseline_alpha,
            beta: self.baseline_beta,
            reason,
        };
        if !(self.baseline_alpha.is_finite() && self.baseline_beta.is_finite()) {
            return Err(invalid("shape parameters must be finite"));
        }
        Beta::new(self.baseline_alpha, self.baseline_beta)
            .map_err(|_| invalid("shape parameters must be positive"))
    }
}

/// Regulatory revision-rate thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThresholdKey {
    #[default]
    #[serde(rename = "fda_510k")]
    Fda510k,
    #[serde(rename = "mdr_pmcf")]
    MdrPmcf,
    #[serde(rename = "registry_parity")]
    RegistryParity,
}

impl ThresholdKey {
    pub const ALL: [ThresholdKey; 3] = [
        ThresholdKey::Fda510k,
        ThresholdKey::MdrPmcf,
        ThresholdKey::RegistryParity,
    ];

    /// Maximum cohort revision rate that passes
    #[must_use]
    pub fn rate(&self) -> f64 {
        match self {
            ThresholdKey::Fda510k => 0.10,
            ThresholdKey::MdrPmcf => 0.12,
            ThresholdKey::RegistryParity => 0.09,
        }
    }

    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            ThresholdKey::Fda510k => "fda_510k",
            ThresholdKey::MdrPmcf => "mdr_pmcf",
            ThresholdKey::RegistryParity => "registry_parity",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            ThresholdKey::Fda510k => "FDA 510(k)",
            ThresholdKey::MdrPmcf => "MDR PMCF",
            ThresholdKey::RegistryParity => "Registry parity",
        }
    }

    /// Parse a key, substituting `fda_510k` for anything unrecognized
    #[must_use]
    pub fn parse_lenient(key: &str) -> Self {
        key.parse().unwrap_or_else(|_| {
            tracing::warn!(threshold_key = key, "unknown threshold key, using fda_510k");
            ThresholdKey::Fda510k
        })
    }
}

impl FromStr for ThresholdKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ThresholdKey::ALL
            .into_iter()
            .find(|key| key.key() == normalized)
            .ok_or_else(|| format!("unknown threshold key '{s}'"))
    }
}

impl fmt::Display for ThresholdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
