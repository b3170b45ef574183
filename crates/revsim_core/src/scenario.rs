//! Side-by-side comparison of cohort configurations
//!
//! The first scenario is the reference. Scenario `i` runs with seed
//! `seed + i`, so every scenario is reproducible on its own.

use rand::RngCore;
#[cfg(feature = "parallel")]
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cohort::{Prevalence, default_prevalence, validate_prevalence};
use crate::config::{ThresholdKey, limits};
use crate::error::{InvalidParameterError, Result};
use crate::model::{MonteCarloSummary, ScenarioComparison};
use crate::simulation::{SimulationEngine, check_range};
use crate::summary::SummaryMetric;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Prevalence overrides laid over the default table
    #[serde(default)]
    pub risk_distribution: Option<Prevalence>,
    /// Factors forced to zero prevalence, regardless of overrides
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl ScenarioSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            risk_distribution: None,
            exclusions: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn prevalence(mut self, factor: impl Into<String>, value: f64) -> Self {
        self.risk_distribution
            .get_or_insert_with(Prevalence::new)
            .insert(factor.into(), value);
        self
    }

    #[must_use]
    pub fn exclude(mut self, factor: impl Into<String>) -> Self {
        self.exclusions.push(factor.into());
        self
    }

    /// Default prevalence, then overrides, then exclusions
    #[must_use]
    pub fn effective_prevalence(&self) -> Prevalence {
        let mut prevalence = default_prevalence();
        if let Some(overrides) = &self.risk_distribution {
            prevalence.extend(overrides.iter().map(|(f, p)| (f.clone(), *p)));
        }
        for factor in &self.exclusions {
            prevalence.insert(factor.clone(), 0.0);
        }
        prevalence
    }
}

/// A comparison request as received from a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub scenarios: Vec<ScenarioSpec>,
    pub n_patients: usize,
    #[serde(default = "default_threshold_key")]
    pub threshold_key: String,
    pub n_iterations: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_threshold_key() -> String {
    ThresholdKey::default().key().to_string()
}

impl ComparisonRequest {
    pub fn validate(&self) -> std::result::Result<(), InvalidParameterError> {
        check_range(
            "n_patients",
            self.n_patients,
            limits::MIN_PATIENTS,
            limits::MAX_PATIENTS,
        )?;
        check_range(
            "n_iterations",
            self.n_iterations,
            limits::MIN_ITERATIONS,
            limits::MAX_ITERATIONS,
        )?;
        validate_scenarios(&self.scenarios)
    }
}

fn validate_scenarios(
    scenarios: &[ScenarioSpec],
) -> std::result::Result<(), InvalidParameterError> {
    if scenarios.is_empty() {
        return Err(InvalidParameterError::NoScenarios);
    }
    if scenarios.len() > limits::MAX_SCENARIOS {
        return Err(InvalidParameterError::TooManyScenarios {
            count: scenarios.len(),
            max: limits::MAX_SCENARIOS,
        });
    }
    for scenario in scenarios {
        if let Some(overrides) = &scenario.risk_distribution {
            validate_prevalence(overrides)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct ScenarioComparator<'a> {
    engine: &'a SimulationEngine,
}

impl<'a> ScenarioComparator<'a> {
    #[must_use]
    pub fn new(engine: &'a SimulationEngine) -> Self {
        Self { engine }
    }

    pub fn compare_request(&self, request: &ComparisonRequest) -> Result<Vec<ScenarioComparison>> {
        request.validate()?;
        self.compare(
            &request.scenarios,
            request.n_patients,
            ThresholdKey::parse_lenient(&request.threshold_key),
            request.n_iterations,
            request.seed,
        )
    }

    /// Run every scenario and express each relative to the first.
    pub fn compare(
        &self,
        scenarios: &[ScenarioSpec],
        n_patients: usize,
        threshold: ThresholdKey,
        n_iterations: usize,
        seed: Option<u64>,
    ) -> Result<Vec<ScenarioComparison>> {
        validate_scenarios(scenarios)?;
        let base_seed = seed.unwrap_or_else(|| rand::rng().next_u64());

        let run_one = |(index, scenario): (usize, &ScenarioSpec)| -> Result<MonteCarloSummary> {
            let prevalence = scenario.effective_prevalence();
            let summary = self.engine.run_generated(
                n_patients,
                Some(&prevalence),
                threshold,
                n_iterations,
                Some(base_seed.wrapping_add(index as u64)),
            )?;
            info!(
                scenario = %scenario.name,
                probability_pass = summary.probability_pass,
                mean = summary.mean_revision_rate,
                "scenario finished"
            );
            Ok(summary)
        };

        #[cfg(feature = "parallel")]
        let summaries: Vec<Result<MonteCarloSummary>> =
            scenarios.par_iter().enumerate().map(run_one).collect();
        #[cfg(not(feature = "parallel"))]
        let summaries: Vec<Result<MonteCarloSummary>> =
            scenarios.iter().enumerate().map(run_one).collect();

        let summaries = summaries.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(build_comparisons(scenarios, summaries))
    }
}

/// Pair scenarios with their summaries and compute deltas against the first
#[must_use]
pub fn build_comparisons(
    scenarios: &[ScenarioSpec],
    summaries: Vec<MonteCarloSummary>,
) -> Vec<ScenarioComparison> {
    let reference = summaries.first().cloned();

    scenarios
        .iter()
        .zip(summaries)
        .enumerate()
        .map(|(index, (scenario, summary))| {
            let (delta_probability, delta_mean_rate) = match &reference {
                Some(reference) if index > 0 => (
                    Some(SummaryMetric::ProbabilityPass.delta(&summary, reference)),
                    Some(SummaryMetric::Mean.delta(&summary, reference)),
                ),
                _ => (None, None),
            };
            ScenarioComparison {
                scenario_name: scenario.name.clone(),
                description: scenario.description.clone(),
                summary,
                delta_probability,
                delta_mean_rate,
            }
        })
        .collect()
}
