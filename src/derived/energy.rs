//! Reactive-to-active energy ratios.

use super::{numeric, reference_lines, with_parsed_timestamp};
use crate::constants::{ENERGY_REFERENCE_KWH, ENERGY_ROUNDING_DECIMALS, columns, derived};
use crate::error::Result;
use crate::models::Category;
use crate::schema::validate_inputs;
use polars::prelude::*;

/// `reactive / active * 100`, zero whenever either energy is zero
fn guarded_ratio(reactive: &str, active: &str) -> Expr {
    let is_zero = |name: &str| numeric(name).eq(lit(0.0)).fill_null(lit(false));
    when(is_zero(reactive).or(is_zero(active)))
        .then(lit(0.0))
        .otherwise(numeric(reactive) / numeric(active) * lit(100.0))
}

/// Round half to even at the given number of decimals
pub fn round_half_even(expr: Expr, decimals: u32) -> Expr {
    expr.round(decimals, RoundMode::HalfToEven)
}

/// Attach `KWH`, `KARH_IND` and `KVARH_CAP`, then round floats to 3 decimals
pub fn build_energy(df: &DataFrame) -> Result<DataFrame> {
    validate_inputs(df, Category::Energy)?;

    let mut ratios = reference_lines(&[(derived::KWH_REFERENCE, ENERGY_REFERENCE_KWH)]);
    ratios.push(
        guarded_ratio(columns::INDUCTIVE_ENERGY, columns::ACTIVE_ENERGY)
            .alias(derived::INDUCTIVE_RATIO),
    );
    ratios.push(
        guarded_ratio(columns::CAPACITIVE_ENERGY, columns::ACTIVE_ENERGY)
            .alias(derived::CAPACITIVE_RATIO),
    );

    let out = with_parsed_timestamp(df)?.lazy().with_columns(ratios).collect()?;

    let rounded: Vec<Expr> = out
        .get_columns()
        .iter()
        .filter(|column| matches!(column.dtype(), DataType::Float32 | DataType::Float64))
        .map(|column| round_half_even(col(column.name().clone()), ENERGY_ROUNDING_DECIMALS))
        .collect();

    Ok(out.lazy().with_columns(rounded).collect()?)
}
