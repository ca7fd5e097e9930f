//! Builders that attach constant reference lines, or only the parsed timestamp.

use super::{reference_lines, with_parsed_timestamp};
use crate::constants::derived;
use crate::error::Result;
use crate::models::{Category, VoltageBand};
use crate::schema::validate_inputs;
use polars::prelude::*;

fn with_lines(df: &DataFrame, lines: &[(&str, f64)]) -> Result<DataFrame> {
    Ok(with_parsed_timestamp(df)?
        .lazy()
        .with_columns(reference_lines(lines))
        .collect()?)
}

/// Voltage readings with lower limit, nominal and upper limit lines
pub fn build_voltage(df: &DataFrame, nominal: f64, band: VoltageBand) -> Result<DataFrame> {
    validate_inputs(df, Category::Voltage)?;
    with_lines(
        df,
        &[
            (derived::VOLTAGE_LOWER_LIMIT, band.lower),
            (derived::NOMINAL_VOLTAGE, nominal),
            (derived::VOLTAGE_UPPER_LIMIT, band.upper),
        ],
    )
}

/// Current readings with the nominal current line
pub fn build_current(df: &DataFrame, nominal_current: f64) -> Result<DataFrame> {
    validate_inputs(df, Category::Current)?;
    with_lines(df, &[(derived::NOMINAL_CURRENT_LIMIT, nominal_current)])
}

/// Voltage THD readings with the distortion reference line
pub fn build_voltage_distortion(df: &DataFrame, reference: f64) -> Result<DataFrame> {
    validate_inputs(df, Category::VoltageDistortion)?;
    with_lines(df, &[(derived::VOLTAGE_DISTORTION_REF, reference)])
}

/// TDD loading frame with the TDD limit line
pub fn build_tdd_final(loading: &DataFrame, tdd_limit: f64) -> Result<DataFrame> {
    with_lines(loading, &[(derived::TDD_LIMIT_REF, tdd_limit)])
}

/// Categories with no computed columns: validate and normalise the timestamp
pub fn build_normalized(df: &DataFrame, category: Category) -> Result<DataFrame> {
    validate_inputs(df, category)?;
    with_parsed_timestamp(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::float_values;
    use crate::thresholds::nominal_voltage_band;

    fn voltage_frame() -> DataFrame {
        df!(
            "Fecha/hora" => ["01/02/24 10:00:00", "01/02/24 10:10:00"],
            "Tensin mn. L12" => [210.0, 212.0],
            "Tensin L12" => [220.0, 221.0],
            "Tensin mx. L12" => [225.0, 226.0],
            "Tensin mn. L23" => [210.0, 212.0],
            "Tensin L23" => [220.0, 221.0],
            "Tensin mx. L23" => [225.0, 226.0],
            "Tensin mn. L31" => [210.0, 212.0],
            "Tensin L31" => [220.0, 221.0],
            "Tensin mx. L31" => [225.0, 226.0],
        )
        .unwrap()
    }

    #[test]
    fn test_voltage_reference_lines() {
        let df = voltage_frame();
        let out = build_voltage(&df, 220.0, nominal_voltage_band(220.0)).unwrap();

        assert_eq!(out.height(), 2);
        let upper = float_values(&out, derived::VOLTAGE_UPPER_LIMIT).unwrap();
        assert!((upper[1].unwrap() - 242.0).abs() < 1e-9);
        assert_eq!(
            float_values(&out, derived::NOMINAL_VOLTAGE).unwrap(),
            vec![Some(220.0), Some(220.0)]
        );
        assert!(df.get_column_index(derived::NOMINAL_VOLTAGE).is_none());
    }

    #[test]
    fn test_normalized_builder_validates_category() {
        let df = voltage_frame();
        assert!(build_normalized(&df, Category::Voltage).is_ok());
        assert!(build_normalized(&df, Category::KFactor).is_err());
    }

    #[test]
    fn test_tdd_limit_line() {
        let df = df!(
            "Fecha/hora" => ["01/02/24 10:00:00"],
            "resultado_TDD_L1" => [3.0],
        )
        .unwrap();
        let out = build_tdd_final(&df, 8.0).unwrap();
        assert_eq!(
            float_values(&out, derived::TDD_LIMIT_REF).unwrap(),
            vec![Some(8.0)]
        );
    }
}
