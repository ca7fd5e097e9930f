//! Voltage and current unbalance columns.

use super::{finite_or_null, numeric, reference_lines, with_parsed_timestamp};
use crate::constants::derived;
use crate::error::Result;
use crate::models::Category;
use crate::schema::{typical_current_columns, typical_voltage_columns, validate_inputs};
use polars::prelude::*;

fn phases(columns: &[&str]) -> Vec<Expr> {
    columns.iter().map(|name| numeric(name)).collect()
}

/// Voltage unbalance: largest deviation from the phase average, as % of the average
pub fn build_voltage_unbalance(df: &DataFrame, reference: f64) -> Result<DataFrame> {
    validate_inputs(df, Category::VoltageUnbalance)?;
    let voltages = phases(typical_voltage_columns());

    let deltas: Vec<Expr> = voltages
        .iter()
        .zip(derived::VOLTAGE_DELTAS)
        .map(|(phase, name)| (col(derived::AVERAGE) - phase.clone()).abs().alias(name))
        .collect();
    let delta_columns: Vec<Expr> = derived::VOLTAGE_DELTAS.iter().map(|name| col(*name)).collect();

    let unbalance = finite_or_null(col(derived::LARGEST_DELTA) / col(derived::AVERAGE) * lit(100.0));

    let out = with_parsed_timestamp(df)?
        .lazy()
        .with_column(mean_horizontal(&voltages, true)?.alias(derived::AVERAGE))
        .with_columns(deltas)
        .with_column(max_horizontal(&delta_columns)?.alias(derived::LARGEST_DELTA))
        .with_column(unbalance.alias(derived::UNBALANCE))
        .with_columns(reference_lines(&[(derived::VOLTAGE_UNBALANCE_REF, reference)]))
        .collect()?;
    Ok(out)
}

/// Current unbalance: (largest phase - average) as % of the average
pub fn build_current_unbalance(df: &DataFrame, reference: f64) -> Result<DataFrame> {
    validate_inputs(df, Category::CurrentUnbalance)?;
    let currents = phases(typical_current_columns());

    let unbalance = finite_or_null(
        (col(derived::LARGEST_CURRENT) - col(derived::AVERAGE)) / col(derived::AVERAGE)
            * lit(100.0),
    );

    let out = with_parsed_timestamp(df)?
        .lazy()
        .with_columns([
            mean_horizontal(&currents, true)?.alias(derived::AVERAGE),
            max_horizontal(&currents)?.alias(derived::LARGEST_CURRENT),
        ])
        .with_column(unbalance.alias(derived::UNBALANCE))
        .with_columns(reference_lines(&[(derived::CURRENT_UNBALANCE_REF, reference)]))
        .collect()?;
    Ok(out)
}
