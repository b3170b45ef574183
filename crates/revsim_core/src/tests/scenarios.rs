//! Tests for scenario comparison
//!
//! These tests verify:
//! - The first scenario is the reference and carries no deltas
//! - Deltas are exact differences against the reference
//! - Each scenario is reproducible on its own seed
//! - Exclusions remove a factor's contribution

use super::default_engine;
use crate::config::ThresholdKey;
use crate::error::{InvalidParameterError, SimulationError};
use crate::scenario::{ComparisonRequest, ScenarioComparator, ScenarioSpec};

fn scenarios() -> Vec<ScenarioSpec> {
    vec![
        ScenarioSpec::new("baseline").description("default prevalence"),
        ScenarioSpec::new("high risk")
            .prevalence("paprosky_3b", 0.40)
            .prevalence("prior_revision", 0.30),
        ScenarioSpec::new("healthy").exclude("smoking").exclude("diabetes"),
    ]
}

#[test]
fn test_reference_has_no_deltas() {
    let engine = default_engine();
    let comparisons = ScenarioComparator::new(&engine)
        .compare(&scenarios(), 150, ThresholdKey::Fda510k, 1_000, Some(10))
        .unwrap();

    assert_eq!(comparisons.len(), 3);
    assert!(comparisons[0].is_reference());
    assert_eq!(comparisons[0].delta_probability, None);
    assert_eq!(comparisons[0].delta_mean_rate, None);
    assert_eq!(comparisons[0].description, "default prevalence");
    assert!(comparisons[1..].iter().all(|c| !c.is_reference()));
}

#[test]
fn test_deltas_are_exact_differences() {
    let engine = default_engine();
    let comparisons = ScenarioComparator::new(&engine)
        .compare(&scenarios(), 150, ThresholdKey::Fda510k, 1_000, Some(10))
        .unwrap();

    let reference = &comparisons[0].summary;
    for comparison in &comparisons[1..] {
        assert_eq!(
            comparison.delta_probability,
            Some(comparison.summary.probability_pass - reference.probability_pass)
        );
        assert_eq!(
            comparison.delta_mean_rate,
            Some(comparison.summary.mean_revision_rate - reference.mean_revision_rate)
        );
    }

    // Heavy revision-history prevalence must raise the mean rate
    assert!(comparisons[1].delta_mean_rate.unwrap() > 0.0);
}

#[test]
fn test_scenarios_use_offset_seeds() {
    let engine = default_engine();
    let specs = scenarios();
    let comparisons = ScenarioComparator::new(&engine)
        .compare(&specs, 120, ThresholdKey::RegistryParity, 600, Some(100))
        .unwrap();

    for (index, (spec, comparison)) in specs.iter().zip(&comparisons).enumerate() {
        let seed = 100 + index as u64;
        let prevalence = spec.effective_prevalence();
        let alone = engine
            .run_generated(120, Some(&prevalence), ThresholdKey::RegistryParity, 600, Some(seed))
            .unwrap();
        assert_eq!(comparison.summary.seed, seed);
        assert!(comparison.summary.same_outcome(&alone));
    }
}

#[test]
fn test_exclusion_overrides_prevalence() {
    let engine = default_engine();
    let specs = vec![
        ScenarioSpec::new("all smokers").prevalence("smoking", 1.0),
        ScenarioSpec::new("excluded smokers")
            .prevalence("smoking", 1.0)
            .exclude("smoking"),
    ];
    assert_eq!(specs[1].effective_prevalence()["smoking"], 0.0);

    let comparisons = ScenarioComparator::new(&engine)
        .compare(&specs, 300, ThresholdKey::Fda510k, 2_000, Some(77))
        .unwrap();
    assert!(comparisons[1].delta_mean_rate.unwrap() < 0.0);
}

#[test]
fn test_comparison_request_validation() {
    let engine = default_engine();
    let comparator = ScenarioComparator::new(&engine);

    let empty = ComparisonRequest {
        scenarios: vec![],
        n_patients: 100,
        threshold_key: "fda_510k".to_string(),
        n_iterations: 500,
        seed: Some(1),
    };
    assert!(matches!(
        comparator.compare_request(&empty),
        Err(SimulationError::InvalidParameter(InvalidParameterError::NoScenarios))
    ));

    let too_few_patients = ComparisonRequest {
        scenarios: scenarios(),
        n_patients: 5,
        ..empty.clone()
    };
    assert!(matches!(
        comparator.compare_request(&too_few_patients),
        Err(SimulationError::InvalidParameter(
            InvalidParameterError::OutOfRange { name: "n_patients", .. }
        ))
    ));

    let ok = ComparisonRequest {
        scenarios: scenarios(),
        ..empty
    };
    assert_eq!(comparator.compare_request(&ok).unwrap().len(), 3);
}

#[test]
fn test_comparison_request_from_json() {
    let json = r#"{
        "scenarios": [
            {"name": "reference"},
            {"name": "no ckd", "exclusions": ["chronic_kidney_disease"]}
        ],
        "n_patients": 100,
        "threshold_key": "mdr_pmcf",
        "n_iterations": 200
    }"#;
    let request: ComparisonRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.scenarios[1].exclusions, vec!["chronic_kidney_disease"]);
    assert!(request.validate().is_ok());
}
