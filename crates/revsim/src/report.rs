//! Rendering of simulation output for the terminal

use std::fmt::Write;

use revsim_core::model::ScenarioComparison;
use revsim_core::summary::SummaryMetric;
use serde::Serialize;

pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// One row per scenario: the metric's value and its change from the reference
#[must_use]
pub fn metric_table(comparisons: &[ScenarioComparison], metric: SummaryMetric) -> String {
    let name_width = comparisons
        .iter()
        .map(|c| c.scenario_name.len())
        .max()
        .unwrap_or(0)
        .max("scenario".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<name_width$}  {:>10}  {:>10}", "scenario", metric, "delta");

    let reference = comparisons.first().map(|c| &c.summary);
    for comparison in comparisons {
        let value = metric.value(&comparison.summary);
        let delta = match reference {
            Some(reference) if !comparison.is_reference() => {
                format!("{:+.4}", metric.delta(&comparison.summary, reference))
            }
            _ => "-".to_string(),
        };
        let _ = writeln!(
            out,
            "{:<name_width$}  {:>10.4}  {:>10}",
            comparison.scenario_name, value, delta
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use revsim_core::config::{EngineConfig, ThresholdKey};
    use revsim_core::registry::HazardRatioRegistry;
    use revsim_core::scenario::{ScenarioComparator, ScenarioSpec};
    use revsim_core::simulation::SimulationEngine;

    fn comparisons() -> Vec<ScenarioComparison> {
        let registry = Arc::new(HazardRatioRegistry::with_defaults().unwrap());
        let engine = SimulationEngine::new(registry, EngineConfig::default()).unwrap();
        ScenarioComparator::new(&engine)
            .compare(
                &[
                    ScenarioSpec::new("reference"),
                    ScenarioSpec::new("complex revisions").prevalence("paprosky_3b", 0.5),
                ],
                100,
                ThresholdKey::Fda510k,
                300,
                Some(9),
            )
            .unwrap()
    }

    #[test]
    fn test_metric_table_layout() {
        let comparisons = comparisons();
        let table = metric_table(&comparisons, SummaryMetric::Mean);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("scenario"));
        assert!(lines[0].contains("mean"));
        assert!(lines[1].starts_with("reference"));
        assert!(lines[1].trim_end().ends_with('-'));

        let delta = SummaryMetric::Mean.delta(&comparisons[1].summary, &comparisons[0].summary);
        assert!(lines[2].trim_end().ends_with(&format!("{delta:+.4}")));
    }

    #[test]
    fn test_json_output_is_parseable() {
        let comparisons = comparisons();
        let json = to_json(&comparisons, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value[0]["delta_probability"].is_null());
        assert_eq!(value[1]["scenario_name"], "complex revisions");
        assert!(value[1]["summary"]["variance_contributions"].is_object());
    }
}
