//! Reduction of per-iteration cohort rates to summary statistics

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidParameterError;
use crate::model::{MonteCarloSummary, Verdict};

/// Linear-interpolated percentile of an ascending slice. `p` is in [0, 1].
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = p.clamp(0.0, 1.0);
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let w = idx - lo as f64;
    sorted[lo] * (1.0 - w) + sorted[hi] * w
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    pub p5: f64,
    pub p95: f64,
    pub probability_pass: f64,
    pub verdict: Verdict,
}

impl SummaryStatistics {
    /// Summarize iteration rates against `threshold_rate` (pass when `rate <= threshold_rate`)
    #[must_use]
    pub fn from_rates(rates: &[f64], threshold_rate: f64) -> Self {
        if rates.is_empty() {
            return Self {
                mean: 0.0,
                median: 0.0,
                std: 0.0,
                p5: 0.0,
                p95: 0.0,
                probability_pass: 0.0,
                verdict: Verdict::from_probability(0.0),
            };
        }

        let n = rates.len() as f64;
        let mean = rates.iter().sum::<f64>() / n;
        let variance = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = rates.to_vec();
        sorted.sort_by(f64::total_cmp);

        let passes = rates.iter().filter(|&&r| r <= threshold_rate).count();
        let probability_pass = passes as f64 / n;

        Self {
            mean,
            median: percentile(&sorted, 0.50),
            std: variance.sqrt(),
            p5: percentile(&sorted, 0.05),
            p95: percentile(&sorted, 0.95),
            probability_pass,
            verdict: Verdict::from_probability(probability_pass),
        }
    }
}

/// Named summary metrics, resolved to accessors up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMetric {
    Mean,
    Median,
    P5,
    P95,
    Std,
    ProbabilityPass,
}

impl SummaryMetric {
    pub const ALL: [SummaryMetric; 6] = [
        SummaryMetric::Mean,
        SummaryMetric::Median,
        SummaryMetric::P5,
        SummaryMetric::P95,
        SummaryMetric::Std,
        SummaryMetric::ProbabilityPass,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SummaryMetric::Mean => "mean",
            SummaryMetric::Median => "median",
            SummaryMetric::P5 => "p5",
            SummaryMetric::P95 => "p95",
            SummaryMetric::Std => "std",
            SummaryMetric::ProbabilityPass => "probability_pass",
        }
    }

    #[must_use]
    pub fn value(&self, summary: &MonteCarloSummary) -> f64 {
        let accessor: fn(&MonteCarloSummary) -> f64 = match self {
            SummaryMetric::Mean => |s| s.mean_revision_rate,
            SummaryMetric::Median => |s| s.median_revision_rate,
            SummaryMetric::P5 => |s| s.p5_revision_rate,
            SummaryMetric::P95 => |s| s.p95_revision_rate,
            SummaryMetric::Std => |s| s.std_revision_rate,
            SummaryMetric::ProbabilityPass => |s| s.probability_pass,
        };
        accessor(summary)
    }

    /// `value(summary) - value(reference)`
    #[must_use]
    pub fn delta(&self, summary: &MonteCarloSummary, reference: &MonteCarloSummary) -> f64 {
        self.value(summary) - self.value(reference)
    }
}

impl FromStr for SummaryMetric {
    type Err = InvalidParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let normalized = normalized
            .strip_suffix("_revision_rate")
            .unwrap_or(&normalized);
        SummaryMetric::ALL
            .into_iter()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| InvalidParameterError::UnknownMetric(s.to_string()))
    }
}

impl fmt::Display for SummaryMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 0.0);
        assert_eq!(percentile(&sorted, 0.5), 2.0);
        assert_eq!(percentile(&sorted, 1.0), 4.0);
        assert!((percentile(&sorted, 0.05) - 0.2).abs() < 1e-12);
        assert!((percentile(&sorted, 0.95) - 3.8).abs() < 1e-12);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_summary_of_known_rates() {
        let rates = [0.05, 0.08, 0.11, 0.07, 0.09];
        let stats = SummaryStatistics::from_rates(&rates, 0.10);

        assert!((stats.mean - 0.08).abs() < 1e-12);
        assert_eq!(stats.median, 0.08);
        assert!((stats.probability_pass - 0.8).abs() < 1e-12);
        assert_eq!(stats.verdict, Verdict::HighConfidence);
        assert!((stats.std - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let stats = SummaryStatistics::from_rates(&[0.10, 0.10], 0.10);
        assert_eq!(stats.probability_pass, 1.0);
    }

    #[test]
    fn test_lower_threshold_never_increases_pass_probability() {
        let rates: Vec<f64> = (0..200).map(|i| f64::from(i) / 1000.0).collect();
        let mut previous = f64::INFINITY;
        for step in (0..=25).rev() {
            let threshold = f64::from(step) / 100.0;
            let p = SummaryStatistics::from_rates(&rates, threshold).probability_pass;
            assert!(p <= previous);
            previous = p;
        }
    }

    #[test]
    fn test_empty_rates() {
        let stats = SummaryStatistics::from_rates(&[], 0.10);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.verdict, Verdict::AtRisk);
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("mean".parse::<SummaryMetric>().unwrap(), SummaryMetric::Mean);
        assert_eq!(
            "p95_revision_rate".parse::<SummaryMetric>().unwrap(),
            SummaryMetric::P95
        );
        assert_eq!(
            " Probability_Pass".parse::<SummaryMetric>().unwrap(),
            SummaryMetric::ProbabilityPass
        );
        assert!(matches!(
            "variance".parse::<SummaryMetric>(),
            Err(InvalidParameterError::UnknownMetric(_))
        ));
    }
}
