//! Summary statistics per measured column.
//!
//! One aggregator serves every category: it reads the category's fixed
//! column list and returns the 95th percentile, mean, minimum and
//! maximum of each column. Missing cells count as zero here, and only
//! here. The power-factor buckets use a variant that ignores missing
//! values instead.

use crate::constants::{STATISTIC_COLUMN, STATISTIC_LABELS, SUMMARY_PERCENTILE, TIMESTAMP_COLUMN};
use crate::derived::{PowerFactorBucket, PowerFactorGroups, numeric, warn_unparsed_cells};
use crate::error::{PqError, Result};
use crate::models::{Category, ColumnStats, LabeledValue};
use crate::schema::require_columns;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Statistics of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    #[serde(flatten)]
    pub stats: ColumnStats,
}

/// Ordered column -> statistics mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryTable {
    entries: Vec<ColumnSummary>,
}

impl SummaryTable {
    pub fn get(&self, column: &str) -> Option<&ColumnStats> {
        self.entries
            .iter()
            .find(|entry| entry.column == column)
            .map(|entry| &entry.stats)
    }

    pub fn percentile(&self, column: &str) -> Option<f64> {
        self.get(column).map(|stats| stats.percentile_95)
    }

    /// Percentiles of the listed columns, in list order
    pub fn percentiles(&self, columns: &[&str]) -> Result<Vec<LabeledValue>> {
        self.collect_stat(columns, |stats| stats.percentile_95)
    }

    /// Maxima of the listed columns, in list order
    pub fn maxima(&self, columns: &[&str]) -> Result<Vec<LabeledValue>> {
        self.collect_stat(columns, |stats| stats.max)
    }

    fn collect_stat(
        &self,
        columns: &[&str],
        stat: impl Fn(&ColumnStats) -> f64,
    ) -> Result<Vec<LabeledValue>> {
        let mut values = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for column in columns {
            match self.get(column) {
                Some(stats) => values.push(LabeledValue::new(*column, stat(stats))),
                None => missing.push(column.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(PqError::MissingColumns {
                category: "summary table".to_string(),
                missing,
            });
        }
        Ok(values)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.column.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSummary> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Transposed table: one row per statistic, one column per measured column
    pub fn to_display_frame(&self) -> Result<DataFrame> {
        let mut frame_columns = Vec::with_capacity(self.entries.len() + 1);
        frame_columns.push(Column::new(
            STATISTIC_COLUMN.into(),
            STATISTIC_LABELS.to_vec(),
        ));
        for entry in &self.entries {
            frame_columns.push(Column::new(
                entry.column.as_str().into(),
                entry.stats.as_array().to_vec(),
            ));
        }
        Ok(DataFrame::new(frame_columns)?)
    }
}

fn stat_alias(column: &str, index: usize) -> String {
    format!("{}::{}", column, STATISTIC_LABELS[index])
}

/// Percentile (linear interpolation, numpy's default), mean, min and max of one column
fn stat_exprs(column: &str, values: Expr) -> [Expr; 4] {
    [
        values
            .clone()
            .quantile(lit(SUMMARY_PERCENTILE / 100.0), QuantileMethod::Linear)
            .alias(stat_alias(column, 0)),
        values.clone().mean().alias(stat_alias(column, 1)),
        values.clone().min().alias(stat_alias(column, 2)),
        values.max().alias(stat_alias(column, 3)),
    ]
}

/// Aggregate the listed columns in one pass; statistics of no values are NaN
fn collect_stats(df: &DataFrame, columns: &[&str], zero_fill: bool) -> Result<Vec<ColumnSummary>> {
    let exprs: Vec<Expr> = columns
        .iter()
        .flat_map(|column| {
            let values = if zero_fill {
                numeric(column).fill_null(lit(0.0))
            } else {
                numeric(column)
            };
            stat_exprs(column, values)
        })
        .collect();

    let aggregated = df.clone().lazy().select(exprs).collect()?;

    columns
        .iter()
        .map(|column| {
            let value = |index: usize| -> Result<f64> {
                let name = stat_alias(column, index);
                let value = aggregated
                    .column(&name)?
                    .as_materialized_series()
                    .cast(&DataType::Float64)?
                    .f64()?
                    .get(0);
                Ok(value.unwrap_or(f64::NAN))
            };

            Ok(ColumnSummary {
                column: column.to_string(),
                stats: ColumnStats {
                    percentile_95: value(0)?,
                    mean: value(1)?,
                    min: value(2)?,
                    max: value(3)?,
                },
            })
        })
        .collect()
}

fn summarize_with_context(df: &DataFrame, context: &str, columns: &[&str]) -> Result<SummaryTable> {
    if df.height() == 0 {
        return Err(PqError::EmptyDataset {
            category: context.to_string(),
        });
    }
    require_columns(df, context, columns)?;
    for column in columns {
        warn_unparsed_cells(df, column)?;
    }

    let entries = collect_stats(df, columns, true)?;
    debug!("Summarized {} columns for {}", entries.len(), context);
    Ok(SummaryTable { entries })
}

/// Summarize the fixed column list of a category
pub fn summarize(df: &DataFrame, category: Category) -> Result<SummaryTable> {
    summarize_with_context(df, category.as_str(), category.summary_columns())
}

/// Summarize an explicit column list
pub fn summarize_columns(df: &DataFrame, columns: &[&str]) -> Result<SummaryTable> {
    summarize_with_context(df, "column selection", columns)
}

/// Per-bucket statistics of the power-factor groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedSummary {
    groups: BTreeMap<PowerFactorBucket, SummaryTable>,
}

impl GroupedSummary {
    pub fn get(&self, bucket: PowerFactorBucket) -> Option<&SummaryTable> {
        self.groups.get(&bucket)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PowerFactorBucket, &SummaryTable)> {
        self.groups.iter().map(|(bucket, table)| (*bucket, table))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Statistics per bucket, ignoring missing values; empty buckets give NaN
pub fn summarize_groups(groups: &PowerFactorGroups) -> Result<GroupedSummary> {
    let mut summaries = BTreeMap::new();

    for (bucket, frame) in groups.iter() {
        let names: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != TIMESTAMP_COLUMN)
            .map(|name| name.to_string())
            .collect();
        let columns: Vec<&str> = names.iter().map(String::as_str).collect();

        let entries = collect_stats(frame, &columns, false)?;
        summaries.insert(bucket, SummaryTable { entries });
    }

    Ok(GroupedSummary { groups: summaries })
}
