//! Simulation outputs
//!
//! Per-iteration results, the Monte Carlo summary handed to callers, and the
//! scenario comparison rows built on top of it.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::hazard::HazardRatioSpec;
use crate::config::ThresholdKey;

/// Pass probability at or above which a cohort is `HighConfidence`
pub const HIGH_CONFIDENCE_CUTOFF: f64 = 0.80;
/// Pass probability at or above which a cohort is `Uncertain` rather than `AtRisk`
pub const UNCERTAIN_CUTOFF: f64 = 0.50;

/// One Monte Carlo iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub cohort_revision_rate: f64,
    pub n_revisions: usize,
    pub baseline_rate: f64,
    pub sampled_hrs: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    HighConfidence,
    Uncertain,
    AtRisk,
}

impl Verdict {
    #[must_use]
    pub fn from_probability(probability_pass: f64) -> Self {
        if probability_pass >= HIGH_CONFIDENCE_CUTOFF {
            Verdict::HighConfidence
        } else if probability_pass >= UNCERTAIN_CUTOFF {
            Verdict::Uncertain
        } else {
            Verdict::AtRisk
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::HighConfidence => "high_confidence",
            Verdict::Uncertain => "uncertain",
            Verdict::AtRisk => "at_risk",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Share of outcome variance (percent) per uncertain input, largest first.
///
/// Serializes as a JSON object whose key order is the contribution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarianceContributions(Vec<(String, f64)>);

impl VarianceContributions {
    /// Build from entries, sorting by contribution (descending) then name
    #[must_use]
    pub fn from_entries(mut entries: Vec<(String, f64)>) -> Self {
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, pct)| (name.as_str(), *pct))
    }

    #[must_use]
    pub fn get(&self, input: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| name == input)
            .map(|(_, pct)| *pct)
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, pct)| pct).sum()
    }

    /// The input with the largest contribution, if any contribution is non-zero
    #[must_use]
    pub fn dominant(&self) -> Option<(&str, f64)> {
        self.iter().next().filter(|(_, pct)| *pct > 0.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for VarianceContributions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, pct)| (name, pct)))
    }
}

impl<'de> Deserialize<'de> for VarianceContributions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = VarianceContributions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of input name to variance percentage")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, pct)) = map.next_entry::<String, f64>()? {
                    entries.push((name, pct));
                }
                Ok(VarianceContributions(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Reduced output of one engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub n_iterations: usize,
    pub n_patients: usize,
    pub threshold_key: ThresholdKey,
    pub threshold: f64,
    pub threshold_name: String,
    pub mean_revision_rate: f64,
    pub median_revision_rate: f64,
    pub p5_revision_rate: f64,
    pub p95_revision_rate: f64,
    pub std_revision_rate: f64,
    pub probability_pass: f64,
    pub verdict: Verdict,
    pub variance_contributions: VarianceContributions,
    /// Seed that reproduces this run
    pub seed: u64,
    /// Hazard-ratio draws replaced by their point estimate
    pub sampling_faults: usize,
    pub execution_time_ms: f64,
    pub generated_at: jiff::Timestamp,
}

impl MonteCarloSummary {
    /// Compare everything except wall-clock fields
    #[must_use]
    pub fn same_outcome(&self, other: &MonteCarloSummary) -> bool {
        self.n_iterations == other.n_iterations
            && self.n_patients == other.n_patients
            && self.threshold_key == other.threshold_key
            && self.threshold.to_bits() == other.threshold.to_bits()
            && self.mean_revision_rate.to_bits() == other.mean_revision_rate.to_bits()
            && self.median_revision_rate.to_bits() == other.median_revision_rate.to_bits()
            && self.p5_revision_rate.to_bits() == other.p5_revision_rate.to_bits()
            && self.p95_revision_rate.to_bits() == other.p95_revision_rate.to_bits()
            && self.std_revision_rate.to_bits() == other.std_revision_rate.to_bits()
            && self.probability_pass.to_bits() == other.probability_pass.to_bits()
            && self.verdict == other.verdict
            && self.variance_contributions == other.variance_contributions
            && self.seed == other.seed
            && self.sampling_faults == other.sampling_faults
    }
}

/// A summary plus the hazard-ratio specs that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub summary: MonteCarloSummary,
    pub hazard_ratios: Vec<HazardRatioSpec>,
}

/// One scenario's summary relative to the first (reference) scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenario_name: String,
    pub description: String,
    pub summary: MonteCarloSummary,
    /// None for the reference scenario
    pub delta_probability: Option<f64>,
    /// None for the reference scenario
    pub delta_mean_rate: Option<f64>,
}

impl ScenarioComparison {
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.delta_probability.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_cut_points() {
        assert_eq!(Verdict::from_probability(1.0), Verdict::HighConfidence);
        assert_eq!(Verdict::from_probability(0.80), Verdict::HighConfidence);
        assert_eq!(Verdict::from_probability(0.7999), Verdict::Uncertain);
        assert_eq!(Verdict::from_probability(0.50), Verdict::Uncertain);
        assert_eq!(Verdict::from_probability(0.4999), Verdict::AtRisk);
        assert_eq!(Verdict::from_probability(0.0), Verdict::AtRisk);
    }

    #[test]
    fn test_verdict_serializes_snake_case() {
        let json = serde_json::to_string(&Verdict::HighConfidence).unwrap();
        assert_eq!(json, "\"high_confidence\"");
        let parsed: Verdict = serde_json::from_str("\"at_risk\"").unwrap();
        assert_eq!(parsed, Verdict::AtRisk);
    }

    #[test]
    fn test_variance_contributions_keep_order_in_json() {
        let contributions = VarianceContributions::from_entries(vec![
            ("smoking".to_string(), 10.0),
            ("baseline_rate".to_string(), 70.0),
            ("diabetes".to_string(), 20.0),
        ]);

        let json = serde_json::to_string(&contributions).unwrap();
        assert_eq!(
            json,
            r#"{"baseline_rate":70.0,"diabetes":20.0,"smoking":10.0}"#
        );

        let parsed: VarianceContributions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, contributions);
        assert_eq!(parsed.dominant(), Some(("baseline_rate", 70.0)));
        assert!((parsed.total() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_dominant_is_none_when_all_zero() {
        let contributions = VarianceContributions::from_entries(vec![
            ("a".to_string(), 0.0),
            ("b".to_string(), 0.0),
        ]);
        assert_eq!(contributions.dominant(), None);
        assert_eq!(contributions.len(), 2);
    }
}
