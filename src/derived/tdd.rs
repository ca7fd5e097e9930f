//! Total demand distortion (TDD) loading per phase.
//!
//! Each phase's current THD is scaled by how loaded the phase is
//! relative to its own peak: `A THD/d Lx * (Corriente mx. Lx / max(Corriente mx. Lx))`.

use super::{finite_or_null, numeric, with_parsed_timestamp};
use crate::constants::{columns, derived};
use crate::error::Result;
use crate::models::Category;
use crate::schema::validate_inputs;
use polars::prelude::*;
use tracing::debug;

const PHASE_MAX_CURRENT_INPUTS: [&str; 3] = [
    columns::CURRENT_MAX_L1,
    columns::CURRENT_MAX_L2,
    columns::CURRENT_MAX_L3,
];

const PHASE_THD_INPUTS: [&str; 3] = [
    columns::CURRENT_THD_L1,
    columns::CURRENT_THD_L2,
    columns::CURRENT_THD_L3,
];

/// Attach per-phase peak current, load ratio and TDD columns
pub fn build_tdd_loading(df: &DataFrame) -> Result<DataFrame> {
    validate_inputs(df, Category::TddLoading)?;

    let mut peaks = Vec::with_capacity(3);
    let mut ratios = Vec::with_capacity(3);
    let mut tdd = Vec::with_capacity(3);
    for phase in 0..3 {
        let current = PHASE_MAX_CURRENT_INPUTS[phase];
        peaks.push(numeric(current).max().alias(derived::PHASE_MAX_CURRENT[phase]));
        ratios.push(
            finite_or_null(numeric(current) / col(derived::PHASE_MAX_CURRENT[phase]))
                .alias(derived::LOAD_RATIO[phase]),
        );
        tdd.push(
            (numeric(PHASE_THD_INPUTS[phase]) * col(derived::LOAD_RATIO[phase]))
                .alias(derived::TDD[phase]),
        );
    }

    let out = with_parsed_timestamp(df)?
        .lazy()
        .with_columns(peaks)
        .with_columns(ratios)
        .with_columns(tdd)
        .collect()?;

    debug!("TDD loading computed over {} rows", out.height());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::float_values;

    fn loading_frame() -> DataFrame {
        df!(
            "Fecha/hora" => ["01/02/24 10:00:00", "01/02/24 10:10:00"],
            "Corriente mx. L1" => [50.0, 100.0],
            "Corriente mx. L2" => [80.0, 40.0],
            "Corriente mx. L3" => [0.0, 0.0],
            "A THD/d L1" => [10.0, 6.0],
            "A THD/d L2" => [5.0, 5.0],
            "A THD/d L3" => [3.0, 4.0],
        )
        .unwrap()
    }

    #[test]
    fn test_tdd_scales_thd_by_relative_load() {
        let out = build_tdd_loading(&loading_frame()).unwrap();

        assert_eq!(
            float_values(&out, "max_Corriente_L1").unwrap(),
            vec![Some(100.0), Some(100.0)]
        );
        assert_eq!(
            float_values(&out, "resultado_Division_L1").unwrap(),
            vec![Some(0.5), Some(1.0)]
        );
        assert_eq!(
            float_values(&out, "resultado_TDD_L1").unwrap(),
            vec![Some(5.0), Some(6.0)]
        );
        assert_eq!(
            float_values(&out, "resultado_TDD_L2").unwrap(),
            vec![Some(5.0), Some(2.5)]
        );
    }

    #[test]
    fn test_zero_peak_gives_null_ratio() {
        let out = build_tdd_loading(&loading_frame()).unwrap();
        assert_eq!(
            float_values(&out, "resultado_Division_L3").unwrap(),
            vec![None, None]
        );
        assert_eq!(
            float_values(&out, "resultado_TDD_L3").unwrap(),
            vec![None, None]
        );
    }
}
