//! Hazard-ratio registry
//!
//! Resolves the full set of hazard-ratio specs once, before any simulation
//! runs, and keeps them immutable for the registry's lifetime. A provider
//! that cannot deliver data is replaced by the built-in default table; a
//! provider that delivers malformed specs is a configuration error.

use rand::Rng;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{ConfigError, DataUnavailableError, SimulationError};
use crate::model::{HazardRatioSampler, HazardRatioSpec, HazardSample};

/// Risk factors the engine models. Provider specs for anything else are dropped.
pub const KNOWN_FACTORS: [&str; 10] = [
    "age_over_80",
    "bmi_over_35",
    "diabetes",
    "osteoporosis",
    "rheumatoid_arthritis",
    "chronic_kidney_disease",
    "smoking",
    "prior_revision",
    "severe_bone_loss",
    "paprosky_3b",
];

const DEFAULT_SOURCE: &str = "built-in default table";

/// Built-in hazard ratios used when the provider is unavailable.
#[must_use]
pub fn default_hazard_ratios() -> Vec<HazardRatioSpec> {
    [
        ("age_over_80", 1.30, 1.10, 1.60),
        ("bmi_over_35", 1.50, 1.20, 1.90),
        ("diabetes", 1.40, 1.20, 1.70),
        ("osteoporosis", 1.30, 1.00, 1.70),
        ("rheumatoid_arthritis", 1.60, 1.30, 2.00),
        ("chronic_kidney_disease", 1.50, 1.20, 1.90),
        ("smoking", 1.30, 1.10, 1.50),
        ("prior_revision", 2.10, 1.70, 2.60),
        ("severe_bone_loss", 1.80, 1.40, 2.30),
        ("paprosky_3b", 2.50, 1.80, 3.50),
    ]
    .into_iter()
    .map(|(factor, hr, lo, hi)| HazardRatioSpec::new(factor, hr, lo, hi, DEFAULT_SOURCE))
    .collect()
}

/// Supplier of hazard-ratio specs (literature database, file, service).
pub trait HazardRatioSource {
    /// Short description used in log messages
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<HazardRatioSpec>, DataUnavailableError>;
}

/// In-memory source
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<HazardRatioSpec>);

impl HazardRatioSource for StaticSource {
    fn describe(&self) -> String {
        format!("static table ({} specs)", self.0.len())
    }

    fn fetch(&self) -> Result<Vec<HazardRatioSpec>, DataUnavailableError> {
        Ok(self.0.clone())
    }
}

/// The built-in default table as a source
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSource;

impl HazardRatioSource for DefaultSource {
    fn describe(&self) -> String {
        DEFAULT_SOURCE.to_string()
    }

    fn fetch(&self) -> Result<Vec<HazardRatioSpec>, DataUnavailableError> {
        Ok(default_hazard_ratios())
    }
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    spec: HazardRatioSpec,
    sampler: HazardRatioSampler,
}

#[derive(Debug, Clone)]
pub struct HazardRatioRegistry {
    // Sorted by factor name so sampling order is stable across runs
    entries: Vec<RegistryEntry>,
    index: FxHashMap<String, usize>,
    used_fallback: bool,
}

impl HazardRatioRegistry {
    /// Load specs from `source`, falling back to the default table when the
    /// source is unavailable or has nothing for the known factors.
    pub fn load(source: &dyn HazardRatioSource) -> Result<Self, SimulationError> {
        let fetched = source.fetch().and_then(|specs| {
            let known = filter_known(specs);
            if known.is_empty() {
                Err(DataUnavailableError::Empty)
            } else {
                Ok(known)
            }
        });

        match fetched {
            Ok(specs) => {
                let missing: Vec<&str> = KNOWN_FACTORS
                    .iter()
                    .copied()
                    .filter(|f| !specs.iter().any(|s| s.factor == *f))
                    .collect();
                if !missing.is_empty() {
                    warn!(
                        source = %source.describe(),
                        ?missing,
                        "hazard ratio source has no estimate for some factors"
                    );
                }
                let registry = Self::from_specs(specs)?;
                debug!(
                    source = %source.describe(),
                    factors = registry.len(),
                    "hazard ratio registry loaded"
                );
                Ok(registry)
            }
            Err(e) => {
                warn!(
                    source = %source.describe(),
                    error = %e,
                    "hazard ratio source unavailable, using default table"
                );
                let mut registry = Self::from_specs(default_hazard_ratios())
                    .map_err(DataUnavailableError::FallbackFailed)?;
                registry.used_fallback = true;
                Ok(registry)
            }
        }
    }

    /// Registry over the built-in default table
    pub fn with_defaults() -> Result<Self, DataUnavailableError> {
        Self::from_specs(default_hazard_ratios()).map_err(DataUnavailableError::FallbackFailed)
    }

    /// Build directly from specs. Every spec is validated; a later spec for
    /// the same factor replaces an earlier one.
    pub fn from_specs(specs: Vec<HazardRatioSpec>) -> Result<Self, ConfigError> {
        let mut by_factor: FxHashMap<String, HazardRatioSpec> = FxHashMap::default();
        for spec in specs {
            spec.validate()?;
            if let Some(previous) = by_factor.insert(spec.factor.clone(), spec) {
                debug!(factor = %previous.factor, "duplicate hazard ratio spec replaced");
            }
        }

        let mut specs: Vec<HazardRatioSpec> = by_factor.into_values().collect();
        specs.sort_by(|a, b| a.factor.cmp(&b.factor));

        let mut entries = Vec::with_capacity(specs.len());
        let mut index = FxHashMap::default();
        for (i, spec) in specs.into_iter().enumerate() {
            let sampler = HazardRatioSampler::new(&spec)?;
            index.insert(spec.factor.clone(), i);
            entries.push(RegistryEntry { spec, sampler });
        }

        Ok(Self {
            entries,
            index,
            used_fallback: false,
        })
    }

    /// Whether the default table replaced an unavailable source
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Factor names in sampling order
    pub fn factors(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.spec.factor.as_str())
    }

    pub fn specs(&self) -> impl Iterator<Item = &HazardRatioSpec> {
        self.entries.iter().map(|e| &e.spec)
    }

    #[must_use]
    pub fn get(&self, factor: &str) -> Option<&HazardRatioSpec> {
        self.index_of(factor).map(|i| &self.entries[i].spec)
    }

    #[must_use]
    pub fn index_of(&self, factor: &str) -> Option<usize> {
        self.index.get(factor).copied()
    }

    /// Draw one hazard ratio for `factor` from its lognormal distribution
    pub fn sample<R: Rng + ?Sized>(&self, factor: &str, rng: &mut R) -> Option<HazardSample> {
        self.index_of(factor)
            .map(|i| self.entries[i].sampler.sample(rng))
    }

    /// Draw one hazard ratio per factor, in sampling order, into `out`.
    /// Returns the number of draws that were clamped to their point estimate.
    pub(crate) fn sample_all<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) -> usize {
        debug_assert_eq!(out.len(), self.entries.len());
        let mut faults = 0;
        for (slot, entry) in out.iter_mut().zip(&self.entries) {
            let sample = entry.sampler.sample(rng);
            if sample.faulted {
                faults += 1;
            }
            *slot = sample.value;
        }
        faults
    }
}

fn filter_known(specs: Vec<HazardRatioSpec>) -> Vec<HazardRatioSpec> {
    specs
        .into_iter()
        .filter(|spec| {
            let known = KNOWN_FACTORS.contains(&spec.factor.as_str());
            if !known {
                debug!(factor = %spec.factor, "ignoring hazard ratio for unmodelled factor");
            }
            known
        })
        .collect()
}
