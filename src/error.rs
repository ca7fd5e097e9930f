//! Error handling for power-quality analysis.
//!
//! Precondition violations (missing columns, malformed limit lists,
//! unsupported TDD brackets) and numeric degeneracy in the threshold
//! calculations are surfaced as typed errors. Nothing here is retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PqError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid configuration file: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Missing required columns for {category}: {}", missing.join(", "))]
    MissingColumns {
        category: String,
        missing: Vec<String>,
    },

    #[error("Limits list must contain exactly {expected} values, found {found}")]
    InvalidLimits { expected: usize, found: usize },

    #[error("TDD limit {value} is not one of the supported brackets (5, 8, 12, 15, 20)")]
    UnsupportedTddBracket { value: f64 },

    #[error("Division by zero in {operation}")]
    DivisionByZero { operation: String },

    #[error("Non-finite input to {operation}")]
    NonFiniteInput { operation: String },

    #[error("Dataset for {category} has no rows")]
    EmptyDataset { category: String },

    #[error("Empty input: {what}")]
    EmptyInput { what: String },

    #[error("Harmonic column '{label}' carries no harmonic order")]
    UnknownHarmonicOrder { label: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl PqError {
    /// Create a division-by-zero error for the named operation
    pub fn division_by_zero(operation: impl Into<String>) -> Self {
        Self::DivisionByZero {
            operation: operation.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PqError>;
