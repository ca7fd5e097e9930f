//! Optional cleaning of raw readings before analysis.

use crate::constants::TIMESTAMP_COLUMN;
use crate::error::Result;
use polars::prelude::*;
use tracing::{debug, info};

/// Fill gaps in a reading series.
///
/// The timestamp is recast to text. Numeric columns of any width become
/// `f64` with their nulls replaced by the column mean, or by zero when the
/// column has no values at all. Text columns get empty strings.
pub fn fill_missing_with_mean(df: &DataFrame) -> Result<DataFrame> {
    let mut fills = Vec::with_capacity(df.width());
    let mut filled_cells = 0usize;

    for column in df.get_columns() {
        let name = column.name().as_str();
        let dtype = column.dtype();

        let fill = if name == TIMESTAMP_COLUMN {
            col(name).cast(DataType::String).fill_null(lit(""))
        } else if dtype.is_primitive_numeric() {
            let values = col(name).cast(DataType::Float64);
            values
                .clone()
                .fill_null(values.mean())
                .fill_null(lit(0.0))
        } else if dtype == &DataType::String {
            col(name).fill_null(lit(""))
        } else {
            continue;
        };

        let gaps = column.null_count();
        if gaps > 0 {
            debug!("{}: {} missing values filled", name, gaps);
            filled_cells += gaps;
        }
        fills.push(fill.alias(name));
    }

    let out = df.clone().lazy().with_columns(fills).collect()?;
    info!("Filled {} missing cells across {} columns", filled_cells, out.width());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derived::float_values;

    #[test]
    fn test_gaps_take_column_mean() {
        let df = df!(
            "Fecha/hora" => [Some("01/02/24 10:00:00"), None, Some("01/02/24 10:20:00")],
            "Corriente L1" => [Some(10.0), None, Some(20.0)],
            "Corriente L2" => [None::<f64>, None, None],
            "Contador" => [Some(1i64), Some(3), None],
        )
        .unwrap();

        let out = fill_missing_with_mean(&df).unwrap();

        assert_eq!(
            float_values(&out, "Corriente L1").unwrap(),
            vec![Some(10.0), Some(15.0), Some(20.0)]
        );
        assert_eq!(
            float_values(&out, "Corriente L2").unwrap(),
            vec![Some(0.0), Some(0.0), Some(0.0)]
        );
        assert_eq!(
            float_values(&out, "Contador").unwrap(),
            vec![Some(1.0), Some(3.0), Some(2.0)]
        );
        assert_eq!(out.column("Fecha/hora").unwrap().null_count(), 0);
        assert_eq!(df.column("Corriente L1").unwrap().null_count(), 1);
    }

    #[test]
    fn test_narrow_integer_columns_are_filled() {
        let df = df!(
            "Fecha/hora" => ["01/02/24 10:00:00", "01/02/24 10:10:00", "01/02/24 10:20:00"],
            "Eventos" => [Some(1i16), None, Some(3)],
            "Interrupciones" => [None, Some(4i8), Some(8)],
            "Etiqueta" => [Some("a"), None, Some("c")],
        )
        .unwrap();

        let out = fill_missing_with_mean(&df).unwrap();

        assert_eq!(out.column("Eventos").unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            float_values(&out, "Eventos").unwrap(),
            vec![Some(1.0), Some(2.0), Some(3.0)]
        );
        assert_eq!(
            float_values(&out, "Interrupciones").unwrap(),
            vec![Some(6.0), Some(4.0), Some(8.0)]
        );
        let labels = out.column("Etiqueta").unwrap();
        assert_eq!(labels.null_count(), 0);
        assert_eq!(labels.as_materialized_series().str().unwrap().get(1), Some(""));
    }
}
