//! Derived-column builders.
//!
//! Every builder takes the raw readings by reference and returns a new
//! frame: a copy of the input with the parsed `fecha_y_Hora` timestamp
//! and the category's computed columns attached. Null inputs stay null
//! in the derived columns; degenerate divisions yield null cells.

pub mod energy;
pub mod power_factor;
pub mod reference;
pub mod tdd;
pub mod unbalance;

pub use energy::build_energy;
pub use power_factor::{PowerFactorBucket, PowerFactorGroups, group_power_factor};
pub use reference::{
    build_current, build_normalized, build_tdd_final, build_voltage, build_voltage_distortion,
};
pub use tdd::build_tdd_loading;
pub use unbalance::{build_current_unbalance, build_voltage_unbalance};

use crate::constants::{PARSED_TIMESTAMP_COLUMN, TIMESTAMP_COLUMN, TIMESTAMP_FORMAT};
use crate::error::Result;
use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::{debug, warn};

/// Parse one export timestamp; anything unparsable is `None`
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

/// Copy the frame, recast `Fecha/hora` to text and attach the parsed `fecha_y_Hora`
pub fn with_parsed_timestamp(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();

    let text = out
        .column(TIMESTAMP_COLUMN)?
        .as_materialized_series()
        .cast(&DataType::String)?;

    let millis: Vec<Option<i64>> = text
        .str()?
        .into_iter()
        .map(|value| value.and_then(parse_timestamp))
        .map(|parsed| parsed.map(|ts| ts.and_utc().timestamp_millis()))
        .collect();

    let unparsed = millis.iter().filter(|v| v.is_none()).count();
    if unparsed > 0 {
        debug!(
            "{} of {} timestamps could not be parsed and were left null",
            unparsed,
            millis.len()
        );
    }

    let parsed = Series::new(PARSED_TIMESTAMP_COLUMN.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    out.with_column(text)?;
    out.with_column(parsed)?;
    Ok(out)
}

/// Warn when reading a column as `f64` turns present cells into nulls
pub(crate) fn warn_unparsed_cells(df: &DataFrame, name: &str) -> Result<()> {
    let column = df.column(name)?;
    if column.dtype().is_primitive_numeric() {
        return Ok(());
    }

    let before = column.null_count();
    let after = column
        .as_materialized_series()
        .cast(&DataType::Float64)?
        .null_count();
    if after > before {
        warn!(
            "{}: {} of {} cells are not numbers and are read as missing",
            name,
            after - before,
            column.len()
        );
    }
    Ok(())
}

/// Read a column as nullable floats; NaN counts as missing
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    warn_unparsed_cells(df, name)?;
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let values = series
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect();
    Ok(values)
}

/// A measured column as `f64`, with NaN read as missing
pub fn numeric(name: &str) -> Expr {
    col(name).cast(DataType::Float64).fill_nan(lit(NULL))
}

/// Null wherever the expression is not a finite number
pub(crate) fn finite_or_null(expr: Expr) -> Expr {
    when(expr.clone().is_finite())
        .then(expr)
        .otherwise(lit(NULL))
}

/// Constant reference lines, one column per `(name, value)`
pub(crate) fn reference_lines(lines: &[(&str, f64)]) -> Vec<Expr> {
    lines
        .iter()
        .map(|(name, value)| lit(*value).alias(*name))
        .collect()
}
