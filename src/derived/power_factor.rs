//! Power-factor readings split by sign into inductive and capacitive buckets.
//!
//! Positive factors are inductive, negative ones capacitive. Each of the
//! three signed columns (minimum, typical, maximum) yields one bucket per
//! sign, holding only the rows where that column has the bucket's sign.
//! Zero and null readings fall in no bucket.

use super::{numeric, with_parsed_timestamp};
use crate::constants::{TIMESTAMP_COLUMN, columns};
use crate::error::Result;
use crate::models::Category;
use crate::schema::require_columns;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// One sign/variant bucket of power-factor readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerFactorBucket {
    #[serde(rename = "F.P. Mn. III - Ind")]
    InductiveMin,
    #[serde(rename = "F.P. III - Ind")]
    Inductive,
    #[serde(rename = "F.P. Mx. III - Ind")]
    InductiveMax,
    #[serde(rename = "F.P. Mn. III - Cap")]
    CapacitiveMin,
    #[serde(rename = "F.P. III - Cap")]
    Capacitive,
    #[serde(rename = "F.P. Mx. III - Cap")]
    CapacitiveMax,
}

impl PowerFactorBucket {
    pub const ALL: [PowerFactorBucket; 6] = [
        PowerFactorBucket::InductiveMin,
        PowerFactorBucket::Inductive,
        PowerFactorBucket::InductiveMax,
        PowerFactorBucket::CapacitiveMin,
        PowerFactorBucket::Capacitive,
        PowerFactorBucket::CapacitiveMax,
    ];

    /// Signed factor column the bucket filters
    pub fn source_column(&self) -> &'static str {
        match self {
            PowerFactorBucket::InductiveMin | PowerFactorBucket::CapacitiveMin => {
                columns::POWER_FACTOR_MIN
            }
            PowerFactorBucket::Inductive | PowerFactorBucket::Capacitive => columns::POWER_FACTOR,
            PowerFactorBucket::InductiveMax | PowerFactorBucket::CapacitiveMax => {
                columns::POWER_FACTOR_MAX
            }
        }
    }

    pub fn is_inductive(&self) -> bool {
        matches!(
            self,
            PowerFactorBucket::InductiveMin
                | PowerFactorBucket::Inductive
                | PowerFactorBucket::InductiveMax
        )
    }

    /// Bucket label, e.g. `F.P. Mx. III - Cap`
    pub fn label(&self) -> String {
        let suffix = if self.is_inductive() { "Ind" } else { "Cap" };
        format!("{} - {}", self.source_column(), suffix)
    }
}

impl fmt::Display for PowerFactorBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The six bucket sub-tables, each with `Fecha/hora` and its factor column
#[derive(Debug, Clone, Default)]
pub struct PowerFactorGroups {
    groups: BTreeMap<PowerFactorBucket, DataFrame>,
}

impl PowerFactorGroups {
    pub fn get(&self, bucket: PowerFactorBucket) -> Option<&DataFrame> {
        self.groups.get(&bucket)
    }

    /// Buckets in label order (inductive first)
    pub fn iter(&self) -> impl Iterator<Item = (PowerFactorBucket, &DataFrame)> {
        self.groups.iter().map(|(bucket, df)| (*bucket, df))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Split the signed power-factor columns into the six buckets
pub fn group_power_factor(df: &DataFrame) -> Result<PowerFactorGroups> {
    require_columns(
        df,
        Category::PowerFactor.as_str(),
        &[
            TIMESTAMP_COLUMN,
            columns::POWER_FACTOR_MIN,
            columns::POWER_FACTOR,
            columns::POWER_FACTOR_MAX,
        ],
    )?;
    let normalized = with_parsed_timestamp(df)?;

    let mut groups = BTreeMap::new();
    for bucket in PowerFactorBucket::ALL {
        let column = bucket.source_column();
        let in_bucket = if bucket.is_inductive() {
            numeric(column).gt(lit(0.0))
        } else {
            numeric(column).lt(lit(0.0))
        };

        let subset = normalized
            .clone()
            .lazy()
            .filter(in_bucket)
            .select([col(TIMESTAMP_COLUMN), col(column)])
            .collect()?;
        debug!("{}: {} rows", bucket, subset.height());
        groups.insert(bucket, subset);
    }

    Ok(PowerFactorGroups { groups })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor_frame() -> DataFrame {
        df!(
            "Fecha/hora" => ["01/02/24 10:00:00", "01/02/24 10:10:00", "01/02/24 10:20:00", "01/02/24 10:30:00"],
            "F.P. Mn. III" => [Some(0.85), Some(-0.70), Some(0.0), None],
            "F.P. III" => [Some(0.92), Some(-0.80), Some(0.95), Some(-0.90)],
            "F.P. Mx. III" => [Some(0.99), Some(0.98), Some(-0.97), Some(0.96)],
        )
        .unwrap()
    }

    #[test]
    fn test_buckets_split_by_sign() {
        let groups = group_power_factor(&factor_frame()).unwrap();
        assert_eq!(groups.len(), 6);

        let ind_min = groups.get(PowerFactorBucket::InductiveMin).unwrap();
        assert_eq!(ind_min.height(), 1);
        assert_eq!(ind_min.width(), 2);

        // zero and null rows belong to no bucket
        let cap_min = groups.get(PowerFactorBucket::CapacitiveMin).unwrap();
        assert_eq!(cap_min.height(), 1);

        assert_eq!(groups.get(PowerFactorBucket::Inductive).unwrap().height(), 2);
        assert_eq!(groups.get(PowerFactorBucket::Capacitive).unwrap().height(), 2);
        assert_eq!(groups.get(PowerFactorBucket::InductiveMax).unwrap().height(), 3);
        assert_eq!(groups.get(PowerFactorBucket::CapacitiveMax).unwrap().height(), 1);
    }

    #[test]
    fn test_bucket_labels() {
        assert_eq!(PowerFactorBucket::InductiveMin.label(), "F.P. Mn. III - Ind");
        assert_eq!(PowerFactorBucket::CapacitiveMax.label(), "F.P. Mx. III - Cap");
        assert_eq!(
            serde_json::to_value(PowerFactorBucket::Capacitive).unwrap(),
            "F.P. III - Cap"
        );

        let order: Vec<_> = group_power_factor(&factor_frame())
            .unwrap()
            .iter()
            .map(|(bucket, _)| bucket)
            .collect();
        assert_eq!(order, PowerFactorBucket::ALL.to_vec());
    }
}
