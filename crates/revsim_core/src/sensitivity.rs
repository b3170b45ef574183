//! Variance attribution across uncertain inputs
//!
//! Each input's share is its squared Pearson correlation with the cohort rate
//! across iterations, normalized so the shares sum to 100. This is an
//! R²-style approximation, not a Sobol index.

use tracing::warn;

use crate::model::VarianceContributions;
use crate::simulation::SimulationTrace;

/// Name under which the sampled baseline rate is reported
pub const BASELINE_INPUT: &str = "baseline_rate";

/// Squared Pearson correlation of `x` and `y`; 0 when either is constant
/// or the result is not finite.
#[must_use]
pub fn r_squared(x: &[f64], y: &[f64]) -> f64 {
    pearson(x, y).map_or(0.0, |r| r * r)
}

/// Pearson correlation, or `None` if it cannot be computed in floating point.
/// Constant series correlate at 0.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 || is_constant(&x[..n]) || is_constant(&y[..n]) {
        return Some(0.0);
    }

    // Correlation is scale-invariant; unit-scaling keeps the sums finite for huge draws
    let x = unit_scaled(&x[..n])?;
    let y = unit_scaled(&y[..n])?;

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(&y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn unit_scaled(values: &[f64]) -> Option<Vec<f64>> {
    let scale = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    (scale.is_finite() && scale > 0.0).then(|| values.iter().map(|v| v / scale).collect())
}

fn is_constant(values: &[f64]) -> bool {
    values.first().is_none_or(|first| values.iter().all(|v| v == first))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SensitivityAnalyzer;

impl SensitivityAnalyzer {
    /// Attribute the variance of `outputs` to each named input series.
    ///
    /// Returns all-zero contributions when the output does not vary.
    #[must_use]
    pub fn analyze(&self, inputs: &[(&str, &[f64])], outputs: &[f64]) -> VarianceContributions {
        let zero = || {
            VarianceContributions::from_entries(
                inputs.iter().map(|(name, _)| (name.to_string(), 0.0)).collect(),
            )
        };

        if is_constant(outputs) {
            return zero();
        }

        let raw: Vec<(String, f64)> = inputs
            .iter()
            .map(|(name, series)| {
                let r2 = pearson(series, outputs).map_or_else(
                    || {
                        warn!(input = %name, "correlation not finite, attributing no variance");
                        0.0
                    },
                    |r| r * r,
                );
                (name.to_string(), r2)
            })
            .collect();

        let total: f64 = raw.iter().map(|(_, r2)| r2).sum();
        if total <= 0.0 || !total.is_finite() {
            return zero();
        }

        VarianceContributions::from_entries(
            raw.into_iter()
                .map(|(name, r2)| (name, r2 / total * 100.0))
                .collect(),
        )
    }

    /// Attribute cohort-rate variance to the baseline and each hazard ratio
    #[must_use]
    pub fn analyze_trace(&self, trace: &SimulationTrace) -> VarianceContributions {
        let mut inputs: Vec<(&str, &[f64])> = Vec::with_capacity(trace.factors.len() + 1);
        inputs.push((BASELINE_INPUT, trace.baseline_rates.as_slice()));
        for (factor, series) in trace.factors.iter().zip(&trace.hazard_ratios) {
            inputs.push((factor.as_str(), series.as_slice()));
        }
        self.analyze(&inputs, &trace.cohort_rates)
    }
}
