//! Configuration management and validation.
//!
//! Provides the equipment nameplate values and reference limits an
//! analysis run needs, with defaults, builder-style overrides and
//! loading from a TOML file.

use crate::constants::{
    DEFAULT_CURRENT_UNBALANCE_REF, DEFAULT_VOLTAGE_DISTORTION_REF, DEFAULT_VOLTAGE_UNBALANCE_REF,
};
use crate::error::{PqError, Result};
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default nominal line-to-line voltage (V)
pub const DEFAULT_NOMINAL_VOLTAGE: f64 = 220.0;

/// Default transformer capacity (VA)
pub const DEFAULT_TRANSFORMER_CAPACITY: f64 = 75_000.0;

/// Default transformer short-circuit impedance (%)
pub const DEFAULT_SHORT_CIRCUIT_IMPEDANCE_PCT: f64 = 4.0;

/// Configuration for a power-quality analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Nominal line-to-line voltage (V)
    pub nominal_voltage: f64,

    /// Transformer capacity (VA)
    pub transformer_capacity: f64,

    /// Transformer short-circuit impedance (%)
    pub short_circuit_impedance_pct: f64,

    /// Voltage unbalance reference (%)
    pub voltage_unbalance_ref: f64,

    /// Current unbalance reference (%)
    pub current_unbalance_ref: f64,

    /// Voltage THD reference (%)
    pub voltage_distortion_ref: f64,

    /// Categories to analyze, in report order
    pub categories: Vec<Category>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            nominal_voltage: DEFAULT_NOMINAL_VOLTAGE,
            transformer_capacity: DEFAULT_TRANSFORMER_CAPACITY,
            short_circuit_impedance_pct: DEFAULT_SHORT_CIRCUIT_IMPEDANCE_PCT,
            voltage_unbalance_ref: DEFAULT_VOLTAGE_UNBALANCE_REF,
            current_unbalance_ref: DEFAULT_CURRENT_UNBALANCE_REF,
            voltage_distortion_ref: DEFAULT_VOLTAGE_DISTORTION_REF,
            categories: Category::ALL.to_vec(),
        }
    }
}

impl AnalysisConfig {
    /// Set the nominal voltage
    pub fn with_nominal_voltage(mut self, nominal_voltage: f64) -> Self {
        self.nominal_voltage = nominal_voltage;
        self
    }

    /// Set the transformer capacity
    pub fn with_transformer_capacity(mut self, capacity: f64) -> Self {
        self.transformer_capacity = capacity;
        self
    }

    /// Set the short-circuit impedance percentage
    pub fn with_short_circuit_impedance(mut self, impedance_pct: f64) -> Self {
        self.short_circuit_impedance_pct = impedance_pct;
        self
    }

    /// Set the voltage unbalance reference
    pub fn with_voltage_unbalance_ref(mut self, reference: f64) -> Self {
        self.voltage_unbalance_ref = reference;
        self
    }

    /// Set the current unbalance reference
    pub fn with_current_unbalance_ref(mut self, reference: f64) -> Self {
        self.current_unbalance_ref = reference;
        self
    }

    /// Set the voltage THD reference
    pub fn with_voltage_distortion_ref(mut self, reference: f64) -> Self {
        self.voltage_distortion_ref = reference;
        self
    }

    /// Restrict the run to the given categories
    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Whether a category is enabled for this run
    pub fn is_enabled(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Check that every nameplate value is finite and positive
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("nominal_voltage", self.nominal_voltage),
            ("transformer_capacity", self.transformer_capacity),
            ("short_circuit_impedance_pct", self.short_circuit_impedance_pct),
            ("voltage_unbalance_ref", self.voltage_unbalance_ref),
            ("current_unbalance_ref", self.current_unbalance_ref),
            ("voltage_distortion_ref", self.voltage_distortion_ref),
        ];

        for (name, value) in values {
            if !value.is_finite() || value <= 0.0 {
                return Err(PqError::configuration(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.categories.is_empty() {
            return Err(PqError::configuration("at least one category must be enabled"));
        }

        Ok(())
    }

    /// Load configuration from a TOML file; absent keys keep their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    /// Default config file location (`<config dir>/pq-analyzer/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| PqError::configuration("could not determine user config directory"))?;
        Ok(config_dir.join("pq-analyzer").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.categories.len(), 13);
        assert_eq!(config.voltage_unbalance_ref, 2.0);
        assert_eq!(config.current_unbalance_ref, 10.0);
        assert_eq!(config.voltage_distortion_ref, 5.0);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AnalysisConfig::default()
            .with_nominal_voltage(440.0)
            .with_transformer_capacity(150_000.0)
            .with_categories(vec![Category::Voltage, Category::Energy]);

        assert_eq!(config.nominal_voltage, 440.0);
        assert_eq!(config.transformer_capacity, 150_000.0);
        assert!(config.is_enabled(Category::Energy));
        assert!(!config.is_enabled(Category::Current));
    }

    #[test]
    fn test_validation_rejects_zero_impedance() {
        let config = AnalysisConfig::default().with_short_circuit_impedance(0.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("short_circuit_impedance_pct"));

        let config = AnalysisConfig::default().with_categories(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
nominal_voltage = 13200.0
categories = ["voltage", "tdd-loading"]
"#,
        )
        .unwrap();

        assert_eq!(config.nominal_voltage, 13200.0);
        assert_eq!(config.transformer_capacity, DEFAULT_TRANSFORMER_CAPACITY);
        assert_eq!(
            config.categories,
            vec![Category::Voltage, Category::TddLoading]
        );
    }

    #[test]
    fn test_config_file_round_trip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "voltage_distortion_ref = 8.0\n").unwrap();

        let config = AnalysisConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.voltage_distortion_ref, 8.0);

        let missing = AnalysisConfig::from_toml_file(&temp_dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(PqError::Io(_))));
    }
}
