//! Monte Carlo revision-rate engine
//!
//! Every run owns its random generator, seeded from the caller's seed (or a
//! fresh random one that is recorded in the summary). Within an iteration one
//! baseline rate and one hazard ratio per factor are drawn and shared by all
//! patients; only the per-patient revision outcome is drawn per patient.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rand::{Rng, RngCore, SeedableRng, distr::Distribution, rngs::SmallRng};
use rand_distr::Beta;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cohort::{CohortGenerator, Prevalence, validate_prevalence};
use crate::config::{EngineConfig, ThresholdKey, limits};
use crate::error::{ConfigError, InvalidParameterError, Result};
use crate::model::{MonteCarloSummary, PatientRiskProfile, SimulationReport, SimulationResult};
use crate::registry::HazardRatioRegistry;
use crate::sensitivity::SensitivityAnalyzer;
use crate::summary::SummaryStatistics;

/// Raw per-iteration record of one engine run, stored column-wise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationTrace {
    pub n_patients: usize,
    pub seed: u64,
    /// Factor names, in the order of `hazard_ratios`
    pub factors: Vec<String>,
    pub cohort_rates: Vec<f64>,
    pub revisions: Vec<usize>,
    pub baseline_rates: Vec<f64>,
    /// `hazard_ratios[factor][iteration]`
    pub hazard_ratios: Vec<Vec<f64>>,
    pub sampling_faults: usize,
}

impl SimulationTrace {
    #[must_use]
    pub fn len(&self) -> usize {
        self.cohort_rates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cohort_rates.is_empty()
    }

    /// Row view of iteration `i`
    #[must_use]
    pub fn iteration(&self, i: usize) -> Option<SimulationResult> {
        let cohort_revision_rate = *self.cohort_rates.get(i)?;
        let sampled_hrs: BTreeMap<String, f64> = self
            .factors
            .iter()
            .zip(&self.hazard_ratios)
            .map(|(factor, series)| (factor.clone(), series[i]))
            .collect();

        Some(SimulationResult {
            cohort_revision_rate,
            n_revisions: self.revisions[i],
            baseline_rate: self.baseline_rates[i],
            sampled_hrs,
        })
    }

    /// Summarize this trace against `threshold`
    #[must_use]
    pub fn summarize(&self, threshold: ThresholdKey, execution_time_ms: f64) -> MonteCarloSummary {
        let stats = SummaryStatistics::from_rates(&self.cohort_rates, threshold.rate());
        let variance_contributions = SensitivityAnalyzer.analyze_trace(self);

        MonteCarloSummary {
            n_iterations: self.len(),
            n_patients: self.n_patients,
            threshold_key: threshold,
            threshold: threshold.rate(),
            threshold_name: threshold.display_name().to_string(),
            mean_revision_rate: stats.mean,
            median_revision_rate: stats.median,
            p5_revision_rate: stats.p5,
            p95_revision_rate: stats.p95,
            std_revision_rate: stats.std,
            probability_pass: stats.probability_pass,
            verdict: stats.verdict,
            variance_contributions,
            seed: self.seed,
            sampling_faults: self.sampling_faults,
            execution_time_ms,
            generated_at: jiff::Timestamp::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationEngine {
    registry: Arc<HazardRatioRegistry>,
    config: EngineConfig,
    baseline: Beta<f64>,
}

impl SimulationEngine {
    pub fn new(
        registry: Arc<HazardRatioRegistry>,
        config: EngineConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let baseline = config.baseline_distribution()?;
        Ok(Self {
            registry,
            config,
            baseline,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &HazardRatioRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generator whose profiles carry this engine's baseline mean
    #[must_use]
    pub fn cohort_generator(&self) -> CohortGenerator {
        CohortGenerator::new(self.config.baseline_mean())
    }

    /// Run `n_iterations` and keep every sampled input and outcome.
    pub fn simulate(
        &self,
        cohort: &[PatientRiskProfile],
        n_iterations: usize,
        seed: u64,
    ) -> std::result::Result<SimulationTrace, InvalidParameterError> {
        if n_iterations == 0 {
            return Err(InvalidParameterError::OutOfRange {
                name: "n_iterations",
                value: 0.0,
                min: 1.0,
                max: f64::INFINITY,
            });
        }

        let mut rng = SmallRng::seed_from_u64(seed);
        let n_factors = self.registry.len();
        let max_risk = self.config.max_risk;

        // Resolve factor names to registry slots once; unregistered factors carry no risk
        let patient_factors: Vec<Vec<usize>> = cohort
            .iter()
            .map(|patient| {
                patient
                    .present_factors()
                    .filter_map(|factor| self.registry.index_of(factor))
                    .collect()
            })
            .collect();

        let mut trace = SimulationTrace {
            n_patients: cohort.len(),
            seed,
            factors: self.registry.factors().map(str::to_string).collect(),
            cohort_rates: Vec::with_capacity(n_iterations),
            revisions: Vec::with_capacity(n_iterations),
            baseline_rates: Vec::with_capacity(n_iterations),
            hazard_ratios: (0..n_factors)
                .map(|_| Vec::with_capacity(n_iterations))
                .collect(),
            sampling_faults: 0,
        };
        let mut hr_draws = vec![1.0; n_factors];

        for _ in 0..n_iterations {
            let baseline_rate = self.baseline.sample(&mut rng);
            trace.sampling_faults += self.registry.sample_all(&mut rng, &mut hr_draws);

            let mut n_revisions = 0usize;
            for factors in &patient_factors {
                let combined_hr: f64 = factors.iter().map(|&i| hr_draws[i]).product();
                let risk = (combined_hr * baseline_rate).min(max_risk);
                if rng.random_bool(risk) {
                    n_revisions += 1;
                }
            }

            let cohort_rate = if cohort.is_empty() {
                0.0
            } else {
                n_revisions as f64 / cohort.len() as f64
            };

            trace.cohort_rates.push(cohort_rate);
            trace.revisions.push(n_revisions);
            trace.baseline_rates.push(baseline_rate);
            for (series, &hr) in trace.hazard_ratios.iter_mut().zip(&hr_draws) {
                series.push(hr);
            }
        }

        if trace.sampling_faults > 0 {
            warn!(
                faults = trace.sampling_faults,
                "hazard ratio draws clamped to point estimates"
            );
        }

        Ok(trace)
    }

    /// Simulate and summarize. Without a seed a random one is drawn and
    /// recorded in the summary.
    pub fn run(
        &self,
        cohort: &[PatientRiskProfile],
        threshold: ThresholdKey,
        n_iterations: usize,
        seed: Option<u64>,
    ) -> Result<MonteCarloSummary> {
        let seed = seed.unwrap_or_else(|| rand::rng().next_u64());
        let started = Instant::now();

        debug!(
            n_patients = cohort.len(),
            n_iterations,
            seed,
            threshold = %threshold,
            "starting monte carlo run"
        );

        let trace = self.simulate(cohort, n_iterations, seed)?;
        let summary = trace.summarize(threshold, started.elapsed().as_secs_f64() * 1000.0);

        debug!(
            mean = summary.mean_revision_rate,
            probability_pass = summary.probability_pass,
            verdict = %summary.verdict,
            elapsed_ms = summary.execution_time_ms,
            "monte carlo run finished"
        );

        Ok(summary)
    }

    /// Generate a cohort and run it. `seed` fixes both the cohort and the run;
    /// the summary's `seed` is this request-level seed.
    pub fn run_generated(
        &self,
        n_patients: usize,
        prevalence: Option<&Prevalence>,
        threshold: ThresholdKey,
        n_iterations: usize,
        seed: Option<u64>,
    ) -> Result<MonteCarloSummary> {
        let seed = seed.unwrap_or_else(|| rand::rng().next_u64());
        let mut streams = SmallRng::seed_from_u64(seed);
        let cohort_seed = streams.next_u64();
        let run_seed = streams.next_u64();

        let mut cohort_rng = SmallRng::seed_from_u64(cohort_seed);
        let cohort = self
            .cohort_generator()
            .generate(n_patients, prevalence, &mut cohort_rng)?;

        let mut summary = self.run(&cohort, threshold, n_iterations, Some(run_seed))?;
        summary.seed = seed;
        Ok(summary)
    }

    /// Validate a request, generate its cohort, run it, and attach the
    /// hazard ratios used.
    pub fn simulate_request(&self, request: &SimulationRequest) -> Result<SimulationReport> {
        request.validate()?;
        let summary = self.run_generated(
            request.n_patients,
            request.risk_distribution.as_ref(),
            request.threshold(),
            request.n_iterations,
            request.seed,
        )?;

        Ok(SimulationReport {
            summary,
            hazard_ratios: self.registry.specs().cloned().collect(),
        })
    }
}

/// A single-cohort simulation request as received from a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub n_patients: usize,
    #[serde(default)]
    pub risk_distribution: Option<Prevalence>,
    #[serde(default = "default_threshold_key")]
    pub threshold_key: String,
    pub n_iterations: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_threshold_key() -> String {
    ThresholdKey::default().key().to_string()
}

impl SimulationRequest {
    /// Threshold for this request; unknown keys resolve to `fda_510k`
    #[must_use]
    pub fn threshold(&self) -> ThresholdKey {
        ThresholdKey::parse_lenient(&self.threshold_key)
    }

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
        if let Some(prevalence) = &self.risk_distribution {
            validate_prevalence(prevalence)?;
        }
        Ok(())
    }
}

pub(crate) fn check_range(
    name: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> std::result::Result<(), InvalidParameterError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InvalidParameterError::OutOfRange {
            name,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        })
    }
}
