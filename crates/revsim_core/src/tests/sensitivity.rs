//! Tests for variance attribution on engine traces

use super::{default_engine, engine_with, uniform_cohort};
use crate::config::ThresholdKey;
use crate::model::HazardRatioSpec;
use crate::sensitivity::{BASELINE_INPUT, SensitivityAnalyzer};

#[test]
fn test_contributions_cover_every_input_and_sum_to_100() {
    let engine = default_engine();
    let summary = engine
        .run_generated(300, None, ThresholdKey::Fda510k, 2_000, Some(31))
        .unwrap();

    let contributions = &summary.variance_contributions;
    assert_eq!(contributions.len(), engine.registry().len() + 1);
    assert!(contributions.get(BASELINE_INPUT).is_some());
    assert!((contributions.total() - 100.0).abs() < 1e-6);

    let values: Vec<f64> = contributions.iter().map(|(_, pct)| pct).collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_baseline_dominates_when_no_factor_is_present() {
    let engine = default_engine();
    let cohort = uniform_cohort(500, &[]);
    let trace = engine.simulate(&cohort, 2_000, 17).unwrap();

    let contributions = SensitivityAnalyzer.analyze_trace(&trace);
    let (dominant, _) = contributions.dominant().unwrap();
    assert_eq!(dominant, BASELINE_INPUT);
}

#[test]
fn test_wide_interval_factor_dominates() {
    // Every patient carries a factor with a very uncertain hazard ratio
    let engine = engine_with(vec![
        HazardRatioSpec::new("severe_bone_loss", 2.0, 0.5, 8.0, "test"),
        HazardRatioSpec::new("smoking", 1.3, 1.25, 1.35, "test"),
    ]);
    let cohort = uniform_cohort(400, &["severe_bone_loss", "smoking"]);
    let trace = engine.simulate(&cohort, 2_000, 23).unwrap();

    let contributions = SensitivityAnalyzer.analyze_trace(&trace);
    let (dominant, share) = contributions.dominant().unwrap();
    assert_eq!(dominant, "severe_bone_loss");
    assert!(share > 50.0);
}

#[test]
fn test_extreme_hazard_ratio_still_attributed() {
    // Draws span hundreds of orders of magnitude and routinely hit the clamp
    let engine = engine_with(vec![HazardRatioSpec::new(
        "smoking", 1e300, 1e-300, 1e300, "test",
    )]);
    let cohort = uniform_cohort(50, &["smoking"]);
    let trace = engine.simulate(&cohort, 5_000, 3).unwrap();

    let contributions = SensitivityAnalyzer.analyze_trace(&trace);
    assert!(contributions.get("smoking").unwrap() > 0.0);
    assert!(contributions.get(BASELINE_INPUT).unwrap() < 100.0);
    assert!((contributions.total() - 100.0).abs() < 1e-6);
}
