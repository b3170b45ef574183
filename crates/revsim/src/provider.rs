//! Hazard-ratio tables stored as YAML
//!
//! ```yaml
//! hazard_ratios:
//!   - factor: diabetes
//!     point_estimate: 1.4
//!     ci_lower: 1.2
//!     ci_upper: 1.7
//!     source: NJR 2023 annual report
//! ```

use std::path::{Path, PathBuf};

use revsim_core::error::DataUnavailableError;
use revsim_core::model::HazardRatioSpec;
use revsim_core::registry::HazardRatioSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HazardRatioFile {
    pub hazard_ratios: Vec<HazardRatioSpec>,
}

impl HazardRatioFile {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    /// Save to YAML string
    pub fn to_yaml(&self) -> Result<String, serde_saphyr::ser::Error> {
        serde_saphyr::to_string(self)
    }
}

/// Hazard-ratio provider backed by a YAML file on disk
#[derive(Debug, Clone)]
pub struct YamlHazardRatioSource {
    path: PathBuf,
}

impl YamlHazardRatioSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HazardRatioSource for YamlHazardRatioSource {
    fn describe(&self) -> String {
        format!("yaml file {}", self.path.display())
    }

    fn fetch(&self) -> Result<Vec<HazardRatioSpec>, DataUnavailableError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DataUnavailableError::Source(format!("{}: {e}", self.path.display())))?;
        let file = HazardRatioFile::from_yaml(&content)
            .map_err(|e| DataUnavailableError::Parse(format!("{}: {e}", self.path.display())))?;
        Ok(file.hazard_ratios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revsim_core::error::SimulationError;
    use revsim_core::registry::{HazardRatioRegistry, KNOWN_FACTORS};

    const TWO_FACTORS: &str = "\
hazard_ratios:
  - factor: diabetes
    point_estimate: 1.9
    ci_lower: 1.5
    ci_upper: 2.4
    source: local registry
  - factor: smoking
    point_estimate: 1.2
    ci_lower: 1.0
    ci_upper: 1.4
";

    #[test]
    fn test_yaml_source_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hr.yaml");
        std::fs::write(&path, TWO_FACTORS).unwrap();

        let registry = HazardRatioRegistry::load(&YamlHazardRatioSource::new(&path)).unwrap();
        assert!(!registry.used_fallback());
        assert_eq!(registry.len(), 2);

        let diabetes = registry.get("diabetes").unwrap();
        assert_eq!(diabetes.point_estimate, 1.9);
        assert_eq!(diabetes.source, "local registry");
        assert_eq!(registry.get("smoking").unwrap().source, "");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let source = YamlHazardRatioSource::new(dir.path().join("absent.yaml"));
        assert!(matches!(source.fetch(), Err(DataUnavailableError::Source(_))));

        let registry = HazardRatioRegistry::load(&source).unwrap();
        assert!(registry.used_fallback());
        assert_eq!(registry.len(), KNOWN_FACTORS.len());
    }

    #[test]
    fn test_unparseable_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hr.yaml");
        std::fs::write(&path, "hazard_ratios: [not, a, spec").unwrap();

        let source = YamlHazardRatioSource::new(&path);
        assert!(matches!(source.fetch(), Err(DataUnavailableError::Parse(_))));
        assert!(HazardRatioRegistry::load(&source).unwrap().used_fallback());
    }

    #[test]
    fn test_malformed_spec_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hr.yaml");
        std::fs::write(
            &path,
            "hazard_ratios:\n  - factor: diabetes\n    point_estimate: 1.4\n    ci_lower: 1.8\n    ci_upper: 1.2\n",
        )
        .unwrap();

        let err = HazardRatioRegistry::load(&YamlHazardRatioSource::new(&path)).unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)));
    }

    #[test]
    fn test_yaml_round_trip_of_defaults() {
        let file = HazardRatioFile {
            hazard_ratios: revsim_core::registry::default_hazard_ratios(),
        };
        let yaml = file.to_yaml().unwrap();
        let parsed = HazardRatioFile::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.hazard_ratios, file.hazard_ratios);
    }
}
