//! Power-Quality Analyzer Library
//!
//! A Rust library for turning three-phase power-quality measurement
//! exports into derived metrics, percentile summaries and compliance
//! verdicts.
//!
//! This library provides tools for:
//! - Computing reference limits from transformer nameplate values
//! - Building derived columns (unbalance, TDD loading, energy ratios)
//! - Summarizing fixed per-category column lists (95th percentile, mean, min, max)
//! - Evaluating voltage, current, unbalance, distortion, harmonic and TDD checks
//! - Running the whole pipeline per category through [`PowerQualityAnalyzer`]

pub mod analyzer;
pub mod cli;
pub mod compliance;
pub mod config;
pub mod constants;
pub mod derived;
pub mod error;
pub mod models;
pub mod prepare;
pub mod schema;
pub mod summary;
pub mod thresholds;

pub use analyzer::{AnalysisReport, CategoryReport, PowerQualityAnalyzer};
pub use compliance::Verdict;
pub use config::AnalysisConfig;
pub use error::{PqError, Result};
pub use models::{Category, ColumnStats, HarmonicLimits, LabeledValue, Loadability, VoltageBand};
pub use summary::{SummaryTable, summarize, summarize_columns, summarize_groups};
pub use thresholds::ThresholdSet;
