//! TOML-based pipeline configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Largest accepted forecast horizon (years).
pub const MAX_HORIZON: usize = 200;

/// Finest accepted grid resolution in degrees.
pub const MIN_STEP_DEG: f64 = 0.01;

/// Top-level pipeline configuration parsed from TOML.
///
/// All fields have defaults matching the baseline run. Load from TOML with
/// [`PipelineConfig::from_toml_file`] or use [`PipelineConfig::baseline`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Trend extrapolation parameters.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Demand model parameters.
    #[serde(default)]
    pub adequacy: AdequacyConfig,
    /// Region lattice parameters.
    #[serde(default)]
    pub grid: GridConfig,
    /// Heat field parameters.
    #[serde(default)]
    pub heat: HeatConfig,
    /// Historical data location.
    #[serde(default)]
    pub source: SourceConfig,
}

/// Trend extrapolation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Number of years to forecast past the last historical year.
    pub horizon: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { horizon: 15 }
    }
}

/// Demand model parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdequacyConfig {
    /// Fractional annual peak-demand growth (must be > -1).
    pub demand_growth: f64,
    /// Fractional reserve margin of base-year generation (must be > -1).
    pub reserve_margin: f64,
}

impl Default for AdequacyConfig {
    fn default() -> Self {
        Self {
            demand_growth: 0.045,
            reserve_margin: 0.15,
        }
    }
}

/// Region lattice parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Lattice spacing in degrees (must be > 0).
    pub step_deg: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { step_deg: 0.12 }
    }
}

/// Heat field parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatConfig {
    /// Seed for the heat-field noise.
    pub seed: u64,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self { seed: 7 }
    }
}

/// Historical data location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// CSV file with generation by source; the bundled sample when absent.
    pub history: Option<PathBuf>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"grid.step_deg"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl PipelineConfig {
    /// Returns the baseline configuration.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Faster demand growth; deficits appear earlier in the horizon.
    pub fn high_growth() -> Self {
        Self {
            adequacy: AdequacyConfig {
                demand_growth: 0.07,
                ..AdequacyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Half the default grid spacing.
    pub fn fine_grid() -> Self {
        Self {
            grid: GridConfig { step_deg: 0.06 },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_growth", "fine_grid"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_growth" => Ok(Self::high_growth()),
            "fine_grid" => Ok(Self::fine_grid()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.forecast.horizon > MAX_HORIZON {
            errors.push(ConfigError {
                field: "forecast.horizon".into(),
                message: format!("must be <= {MAX_HORIZON}"),
            });
        }

        let a = &self.adequacy;
        if !(a.demand_growth.is_finite() && a.demand_growth > -1.0) {
            errors.push(ConfigError {
                field: "adequacy.demand_growth".into(),
                message: "must be a finite number > -1".into(),
            });
        }
        if !(a.reserve_margin.is_finite() && a.reserve_margin > -1.0) {
            errors.push(ConfigError {
                field: "adequacy.reserve_margin".into(),
                message: "must be a finite number > -1".into(),
            });
        }

        let step = self.grid.step_deg;
        if !(step.is_finite() && step >= MIN_STEP_DEG) {
            errors.push(ConfigError {
                field: "grid.step_deg".into(),
                message: format!("must be a finite number >= {MIN_STEP_DEG}"),
            });
        }

        errors
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "horizon={} step_deg={} demand_growth={} reserve_margin={} seed={}",
            self.forecast.horizon,
            self.grid.step_deg,
            self.adequacy.demand_growth,
            self.adequacy.reserve_margin,
            self.heat.seed
        )
    }
}
