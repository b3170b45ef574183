use std::fmt;

/// Errors in hazard-ratio specs or engine calibration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidHazardRatio {
        factor: String,
        point_estimate: f64,
        ci_lower: f64,
        ci_upper: f64,
        reason: &'static str,
    },
    InvalidBaseline {
        alpha: f64,
        beta: f64,
        reason: &'static str,
    },
    InvalidRiskCap(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHazardRatio {
                factor,
                point_estimate,
                ci_lower,
                ci_upper,
                reason,
            } => write!(
                f,
                "invalid hazard ratio for {factor} (estimate={point_estimate}, \
                 ci=[{ci_lower}, {ci_upper}]): {reason}"
            ),
            ConfigError::InvalidBaseline {
                alpha,
                beta,
                reason,
            } => write!(
                f,
                "invalid baseline Beta parameters (alpha={alpha}, beta={beta}): {reason}"
            ),
            ConfigError::InvalidRiskCap(cap) => {
                write!(f, "risk cap {cap} must lie in (0, 1]")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// The hazard-ratio provider could not supply a usable table
#[derive(Debug, Clone, PartialEq)]
pub enum DataUnavailableError {
    /// Provider I/O or transport failure
    Source(String),
    /// Provider data could not be parsed
    Parse(String),
    /// Provider returned no specs for any known factor
    Empty,
    /// The built-in default table failed validation as well
    FallbackFailed(ConfigError),
}

impl fmt::Display for DataUnavailableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataUnavailableError::Source(msg) => write!(f, "hazard ratio source failed: {msg}"),
            DataUnavailableError::Parse(msg) => {
                write!(f, "hazard ratio data could not be parsed: {msg}")
            }
            DataUnavailableError::Empty => {
                write!(f, "hazard ratio source returned no known factors")
            }
            DataUnavailableError::FallbackFailed(e) => {
                write!(f, "default hazard ratio table unusable: {e}")
            }
        }
    }
}

impl std::error::Error for DataUnavailableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataUnavailableError::FallbackFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Out-of-range simulation inputs
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidParameterError {
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    Prevalence {
        factor: String,
        value: f64,
    },
    NoScenarios,
    TooManyScenarios {
        count: usize,
        max: usize,
    },
    UnknownMetric(String),
}

impl fmt::Display for InvalidParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidParameterError::OutOfRange {
                name,
                value,
                min,
                max,
            } => write!(f, "{name}={value} is outside [{min}, {max}]"),
            InvalidParameterError::Prevalence { factor, value } => {
                write!(f, "prevalence for {factor} must lie in [0, 1], got {value}")
            }
            InvalidParameterError::NoScenarios => write!(f, "at least one scenario is required"),
            InvalidParameterError::TooManyScenarios { count, max } => {
                write!(f, "{count} scenarios requested, at most {max} allowed")
            }
            InvalidParameterError::UnknownMetric(name) => write!(f, "unknown metric '{name}'"),
        }
    }
}

impl std::error::Error for InvalidParameterError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Config(ConfigError),
    DataUnavailable(DataUnavailableError),
    InvalidParameter(InvalidParameterError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "configuration error: {e}"),
            SimulationError::DataUnavailable(e) => write!(f, "data unavailable: {e}"),
            SimulationError::InvalidParameter(e) => write!(f, "invalid parameter: {e}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Config(e) => Some(e),
            SimulationError::DataUnavailable(e) => Some(e),
            SimulationError::InvalidParameter(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        SimulationError::Config(e)
    }
}

impl From<DataUnavailableError> for SimulationError {
    fn from(e: DataUnavailableError) -> Self {
        SimulationError::DataUnavailable(e)
    }
}

impl From<InvalidParameterError> for SimulationError {
    fn from(e: InvalidParameterError) -> Self {
        SimulationError::InvalidParameter(e)
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
