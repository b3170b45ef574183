//! Literature-derived hazard ratios and their sampling distributions

use rand::{Rng, distr::Distribution};
use rand_distr::LogNormal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Width of a 95% confidence interval in standard deviations under normality.
pub const CI95_WIDTH_IN_SD: f64 = 3.92;

/// Draws retried before a faulty lognormal sample is clamped to the point estimate.
pub const MAX_SAMPLE_RETRIES: usize = 8;

/// One risk factor's effect-size estimate with its 95% confidence interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardRatioSpec {
    pub factor: String,
    pub point_estimate: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    #[serde(default)]
    pub source: String,
}

impl HazardRatioSpec {
    pub fn new(
        factor: impl Into<String>,
        point_estimate: f64,
        ci_lower: f64,
        ci_upper: f64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            factor: factor.into(),
            point_estimate,
            ci_lower,
            ci_upper,
            source: source.into(),
        }
    }

    /// Mean of the sampling distribution on the log scale
    #[must_use]
    pub fn log_mean(&self) -> f64 {
        self.point_estimate.ln()
    }

    /// Standard deviation on the log scale, derived from the CI width
    #[must_use]
    pub fn log_std(&self) -> f64 {
        ((self.ci_upper.ln() - self.ci_lower.ln()) / CI95_WIDTH_IN_SD).max(0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::InvalidHazardRatio {
            factor: self.factor.clone(),
            point_estimate: self.point_estimate,
            ci_lower: self.ci_lower,
            ci_upper: self.ci_upper,
            reason,
        };

        if self.factor.trim().is_empty() {
            return Err(invalid("factor name must not be empty"));
        }
        if !(self.point_estimate.is_finite()
            && self.ci_lower.is_finite()
            && self.ci_upper.is_finite())
        {
            return Err(invalid("values must be finite"));
        }
        if self.point_estimate <= 0.0 || self.ci_lower <= 0.0 {
            return Err(invalid("hazard ratios must be strictly positive"));
        }
        if self.ci_upper < self.ci_lower {
            return Err(invalid("ci_upper must not be below ci_lower"));
        }
        Ok(())
    }
}

/// A single hazard-ratio draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardSample {
    pub value: f64,
    /// Every retry produced a non-finite or non-positive value and the
    /// point estimate was substituted.
    pub faulted: bool,
}

/// Pre-built lognormal sampler for one spec.
#[derive(Debug, Clone)]
pub struct HazardRatioSampler {
    point_estimate: f64,
    // None for a degenerate CI: always returns the point estimate
    distribution: Option<LogNormal<f64>>,
}

impl HazardRatioSampler {
    pub fn new(spec: &HazardRatioSpec) -> Result<Self, ConfigError> {
        spec.validate()?;

        let log_std = spec.log_std();
        let distribution = if log_std == 0.0 {
            None
        } else {
            Some(LogNormal::new(spec.log_mean(), log_std).map_err(|_| {
                ConfigError::InvalidHazardRatio {
                    factor: spec.factor.clone(),
                    point_estimate: spec.point_estimate,
                    ci_lower: spec.ci_lower,
                    ci_upper: spec.ci_upper,
                    reason: "log-scale standard deviation must be finite",
                }
            })?)
        };

        Ok(Self {
            point_estimate: spec.point_estimate,
            distribution,
        })
    }

    #[must_use]
    pub fn point_estimate(&self) -> f64 {
        self.point_estimate
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> HazardSample {
        let Some(distribution) = &self.distribution else {
            return HazardSample {
                value: self.point_estimate,
                faulted: false,
            };
        };

        for _ in 0..MAX_SAMPLE_RETRIES {
            let value = distribution.sample(rng);
            if value.is_finite() && value > 0.0 {
                return HazardSample {
                    value,
                    faulted: false,
                };
            }
        }

        HazardSample {
            value: self.point_estimate,
            faulted: true,
        }
    }
}
