//! Column contracts per measurement category.
//!
//! Every category works on a fixed list of column names. The lists are
//! declared here once and checked against a dataset before any
//! computation runs, so a missing column fails fast with a
//! [`PqError::MissingColumns`] naming every absent column.

use crate::constants::columns::*;
use crate::constants::{TIMESTAMP_COLUMN, derived};
use crate::error::{PqError, Result};
use crate::models::Category;
use polars::prelude::*;
use tracing::debug;

const VOLTAGE_SUMMARY: &[&str] = &[
    VOLTAGE_MIN_L12,
    VOLTAGE_L12,
    VOLTAGE_MAX_L12,
    VOLTAGE_MIN_L23,
    VOLTAGE_L23,
    VOLTAGE_MAX_L23,
    VOLTAGE_MIN_L31,
    VOLTAGE_L31,
    VOLTAGE_MAX_L31,
];

const VOLTAGE_UNBALANCE_SUMMARY: &[&str] = &[
    VOLTAGE_L12,
    VOLTAGE_L23,
    VOLTAGE_L31,
    derived::AVERAGE,
    derived::VOLTAGE_DELTAS[0],
    derived::VOLTAGE_DELTAS[1],
    derived::VOLTAGE_DELTAS[2],
    derived::UNBALANCE,
];

const CURRENT_SUMMARY: &[&str] = &[
    CURRENT_MIN_L1,
    CURRENT_L1,
    CURRENT_MAX_L1,
    CURRENT_MIN_L2,
    CURRENT_L2,
    CURRENT_MAX_L2,
    CURRENT_MIN_L3,
    CURRENT_L3,
    CURRENT_MAX_L3,
    NEUTRAL_CURRENT_MIN,
    NEUTRAL_CURRENT,
    NEUTRAL_CURRENT_MAX,
];

const CURRENT_UNBALANCE_SUMMARY: &[&str] = &[
    CURRENT_L1,
    CURRENT_L2,
    CURRENT_L3,
    derived::AVERAGE,
    derived::LARGEST_CURRENT,
    derived::UNBALANCE,
];

const POWER_SUMMARY: &[&str] = &[
    ACTIVE_POWER_MIN,
    ACTIVE_POWER,
    ACTIVE_POWER_MAX,
    CAPACITIVE_POWER_MIN,
    CAPACITIVE_POWER,
    CAPACITIVE_POWER_MAX,
    INDUCTIVE_POWER_MIN,
    INDUCTIVE_POWER,
    INDUCTIVE_POWER_MAX,
    APPARENT_POWER_MIN,
    APPARENT_POWER,
    APPARENT_POWER_MAX,
];

const POWER_FACTOR_SUMMARY: &[&str] = &[
    POWER_FACTOR_MIN_DASH,
    POWER_FACTOR_DASH,
    POWER_FACTOR_MAX_DASH,
    POWER_FACTOR_MIN,
    POWER_FACTOR,
    POWER_FACTOR_MAX,
];

const VOLTAGE_THD: &[&str] = &[VOLTAGE_THD_MAX_L1, VOLTAGE_THD_MAX_L2, VOLTAGE_THD_MAX_L3];

const VOLTAGE_DISTORTION_SUMMARY: &[&str] = &[
    VOLTAGE_THD_MAX_L1,
    VOLTAGE_THD_MAX_L2,
    VOLTAGE_THD_MAX_L3,
    derived::VOLTAGE_DISTORTION_REF,
];

const CURRENT_DISTORTION_SUMMARY: &[&str] = &[CURRENT_THD_L1, CURRENT_THD_L2, CURRENT_THD_L3];

const K_FACTOR_SUMMARY: &[&str] = &[
    K_FACTOR_MIN_L1,
    K_FACTOR_L1,
    K_FACTOR_MAX_L1,
    K_FACTOR_MIN_L2,
    K_FACTOR_L2,
    K_FACTOR_MAX_L2,
    K_FACTOR_MIN_L3,
    K_FACTOR_L3,
    K_FACTOR_MAX_L3,
];

const TDD_LOADING_INPUTS: &[&str] = &[
    CURRENT_MAX_L1,
    CURRENT_MAX_L2,
    CURRENT_MAX_L3,
    CURRENT_THD_L1,
    CURRENT_THD_L2,
    CURRENT_THD_L3,
];

const ENERGY_INPUTS: &[&str] = &[
    ACTIVE_ENERGY,
    CAPACITIVE_ENERGY,
    INDUCTIVE_ENERGY,
    POWER_FACTOR_DASH,
    POWER_FACTOR,
];

const ENERGY_SUMMARY: &[&str] = &[
    ACTIVE_ENERGY,
    CAPACITIVE_ENERGY,
    INDUCTIVE_ENERGY,
    derived::KWH_REFERENCE,
    derived::INDUCTIVE_RATIO,
    derived::CAPACITIVE_RATIO,
    POWER_FACTOR_DASH,
    POWER_FACTOR,
];

impl Category {
    /// Columns aggregated by the summary engine, in table order
    pub fn summary_columns(&self) -> &'static [&'static str] {
        match self {
            Category::Voltage => VOLTAGE_SUMMARY,
            Category::VoltageUnbalance => VOLTAGE_UNBALANCE_SUMMARY,
            Category::Current => CURRENT_SUMMARY,
            Category::CurrentUnbalance => CURRENT_UNBALANCE_SUMMARY,
            Category::Power => POWER_SUMMARY,
            Category::PowerFactor => POWER_FACTOR_SUMMARY,
            Category::VoltageDistortion => VOLTAGE_DISTORTION_SUMMARY,
            Category::VoltageHarmonics => &VOLTAGE_HARMONICS,
            Category::CurrentDistortion => CURRENT_DISTORTION_SUMMARY,
            Category::CurrentHarmonics => &CURRENT_HARMONICS,
            Category::KFactor => K_FACTOR_SUMMARY,
            Category::TddLoading => &derived::TDD,
            Category::Energy => ENERGY_SUMMARY,
        }
    }

    /// Raw measurement columns the category's builder needs, excluding the timestamp
    pub fn input_columns(&self) -> &'static [&'static str] {
        match self {
            Category::VoltageUnbalance => &VOLTAGE_SUMMARY_TYPICAL,
            Category::CurrentUnbalance => &CURRENT_TYPICAL,
            Category::VoltageDistortion => VOLTAGE_THD,
            Category::TddLoading => TDD_LOADING_INPUTS,
            Category::Energy => ENERGY_INPUTS,
            other => other.summary_columns(),
        }
    }
}

const VOLTAGE_SUMMARY_TYPICAL: [&str; 3] = [VOLTAGE_L12, VOLTAGE_L23, VOLTAGE_L31];

const CURRENT_TYPICAL: [&str; 3] = [CURRENT_L1, CURRENT_L2, CURRENT_L3];

/// Typical (non min/max) line-to-line voltage columns
pub fn typical_voltage_columns() -> &'static [&'static str] {
    &VOLTAGE_SUMMARY_TYPICAL
}

/// Typical (non min/max) phase current columns
pub fn typical_current_columns() -> &'static [&'static str] {
    &CURRENT_TYPICAL
}

/// Neutral current columns
pub fn neutral_current_columns() -> &'static [&'static str] {
    &CURRENT_SUMMARY[9..]
}

/// Per-phase maximum voltage THD columns
pub fn voltage_thd_columns() -> &'static [&'static str] {
    VOLTAGE_THD
}

/// Fail with [`PqError::MissingColumns`] unless every listed column is present
pub fn require_columns(df: &DataFrame, context: &str, columns: &[&str]) -> Result<()> {
    let missing: Vec<String> = columns
        .iter()
        .filter(|name| df.get_column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    debug!(
        "Column check for {} failed: {} of {} columns missing",
        context,
        missing.len(),
        columns.len()
    );
    Err(PqError::MissingColumns {
        category: context.to_string(),
        missing,
    })
}

/// Validate a raw dataset against the input contract of a category
pub fn validate_inputs(df: &DataFrame, category: Category) -> Result<()> {
    let mut expected = Vec::with_capacity(category.input_columns().len() + 1);
    expected.push(TIMESTAMP_COLUMN);
    expected.extend_from_slice(category.input_columns());
    require_columns(df, category.as_str(), &expected)
}
