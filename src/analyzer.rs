//! Analysis orchestration.
//!
//! Runs every enabled category through the same four steps: build the
//! derived frame, summarize its fixed column list, pick the statistics
//! the category's check needs and evaluate the verdict.

use crate::compliance::{
    Verdict, evaluate_current, evaluate_current_harmonics, evaluate_tdd, evaluate_unbalance,
    evaluate_voltage_band, evaluate_voltage_distortion, partition_harmonic_orders,
};
use crate::config::AnalysisConfig;
use crate::constants::{columns, derived as derived_columns};
use crate::derived::{self, group_power_factor};
use crate::error::{PqError, Result};
use crate::models::{Category, LabeledValue, Loadability};
use crate::schema::{
    neutral_current_columns, require_columns, typical_current_columns, typical_voltage_columns,
    voltage_thd_columns,
};
use crate::summary::{GroupedSummary, SummaryTable, summarize, summarize_columns, summarize_groups};
use crate::thresholds::{DemandLimits, ThresholdSet, loadability_and_headroom, voltage_variation_percent};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

const PHASE_MAX_CURRENT_COLUMNS: [&str; 3] = [
    columns::CURRENT_MAX_L1,
    columns::CURRENT_MAX_L2,
    columns::CURRENT_MAX_L3,
];

/// Outcome of one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub summary: SummaryTable,
    /// Per-bucket statistics, power factor only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouped: Option<GroupedSummary>,
    /// Categories without a compliance check carry statistics only
    pub verdict: Option<Verdict>,
    #[serde(skip)]
    pub derived: DataFrame,
}

/// Outcome of a full analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub thresholds: ThresholdSet,
    /// Deviation of each line voltage percentile from nominal (%)
    pub voltage_variation: Option<Vec<LabeledValue>>,
    pub loadability: Option<Loadability>,
    pub categories: Vec<CategoryReport>,
}

impl AnalysisReport {
    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|report| report.category == category)
    }

    /// Number of categories whose check failed
    pub fn failed_checks(&self) -> usize {
        self.categories
            .iter()
            .filter_map(|report| report.verdict.as_ref())
            .filter(|verdict| !verdict.passed())
            .count()
    }
}

/// Runs the per-category pipeline with one configuration
pub struct PowerQualityAnalyzer {
    config: AnalysisConfig,
}

impl PowerQualityAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze interval readings, and hourly energy readings when given
    pub fn analyze(&self, readings: &DataFrame, hourly: Option<&DataFrame>) -> Result<AnalysisReport> {
        self.config.validate()?;
        info!(
            "Analyzing {} categories over {} readings",
            self.config.categories.len(),
            readings.height()
        );

        let mut thresholds = ThresholdSet::from_config(&self.config)?;
        if self.config.is_enabled(Category::TddLoading)
            || self.config.is_enabled(Category::CurrentHarmonics)
        {
            let max_current = max_measured_current(readings)?;
            thresholds = thresholds.with_max_measured_current(max_current)?;
        }

        let mut reports = Vec::with_capacity(self.config.categories.len());
        for &category in &self.config.categories {
            let frame = match (category, hourly) {
                (Category::Energy, Some(hourly)) => hourly,
                _ => readings,
            };
            debug!("Running {} on {} rows", category, frame.height());
            let report = self.run_category(category, frame, &thresholds)?;
            if let Some(verdict) = &report.verdict {
                info!(
                    "{}: {}",
                    category.title(),
                    if verdict.passed() { "pass" } else { "fail" }
                );
            }
            reports.push(report);
        }

        let voltage_variation = match reports.iter().find(|r| r.category == Category::Voltage) {
            Some(report) => {
                let percentiles = report.summary.percentiles(typical_voltage_columns())?;
                let values: Vec<f64> = percentiles.iter().map(|p| p.value).collect();
                let variation = voltage_variation_percent(&values, thresholds.nominal_voltage)?;
                Some(
                    percentiles
                        .into_iter()
                        .zip(variation)
                        .map(|(p, v)| LabeledValue::new(p.label, v))
                        .collect(),
                )
            }
            None => None,
        };

        let loadability = match reports.iter().find(|r| r.category == Category::Power) {
            Some(report) => {
                let apparent = report
                    .summary
                    .percentile(columns::APPARENT_POWER_MAX)
                    .ok_or_else(|| PqError::MissingColumns {
                        category: Category::Power.as_str().to_string(),
                        missing: vec![columns::APPARENT_POWER_MAX.to_string()],
                    })?;
                Some(loadability_and_headroom(self.config.transformer_capacity, apparent)?)
            }
            None => None,
        };

        Ok(AnalysisReport {
            thresholds,
            voltage_variation,
            loadability,
            categories: reports,
        })
    }

    /// Build, summarize and evaluate one category
    pub fn run_category(
        &self,
        category: Category,
        df: &DataFrame,
        thresholds: &ThresholdSet,
    ) -> Result<CategoryReport> {
        let mut grouped = None;

        let (frame, verdict_input) = match category {
            Category::Voltage => (
                derived::build_voltage(df, thresholds.nominal_voltage, thresholds.voltage_band)?,
                VerdictInput::VoltageBand,
            ),
            Category::VoltageUnbalance => (
                derived::build_voltage_unbalance(df, thresholds.voltage_unbalance_ref)?,
                VerdictInput::Unbalance(thresholds.voltage_unbalance_ref),
            ),
            Category::Current => (
                derived::build_current(df, thresholds.nominal_current)?,
                VerdictInput::Current,
            ),
            Category::CurrentUnbalance => (
                derived::build_current_unbalance(df, thresholds.current_unbalance_ref)?,
                VerdictInput::Unbalance(thresholds.current_unbalance_ref),
            ),
            Category::PowerFactor => {
                let frame = derived::build_normalized(df, category)?;
                grouped = Some(summarize_groups(&group_power_factor(df)?)?);
                (frame, VerdictInput::None)
            }
            Category::VoltageDistortion => (
                derived::build_voltage_distortion(df, thresholds.voltage_distortion_ref)?,
                VerdictInput::VoltageDistortion,
            ),
            Category::CurrentHarmonics => (
                derived::build_normalized(df, category)?,
                VerdictInput::CurrentHarmonics,
            ),
            Category::TddLoading => {
                let demand = demand_limits(thresholds)?;
                let loading = derived::build_tdd_loading(df)?;
                (
                    derived::build_tdd_final(&loading, demand.tdd_limit)?,
                    VerdictInput::Tdd,
                )
            }
            Category::Energy => (derived::build_energy(df)?, VerdictInput::None),
            Category::Power
            | Category::VoltageHarmonics
            | Category::CurrentDistortion
            | Category::KFactor => (derived::build_normalized(df, category)?, VerdictInput::None),
        };

        let summary = summarize(&frame, category)?;
        let verdict = verdict_input.evaluate(&summary, thresholds)?;

        Ok(CategoryReport {
            category,
            summary,
            grouped,
            verdict,
            derived: frame,
        })
    }
}

/// Which check a category feeds, with any reference value it needs
enum VerdictInput {
    None,
    VoltageBand,
    Current,
    Unbalance(f64),
    VoltageDistortion,
    CurrentHarmonics,
    Tdd,
}

impl VerdictInput {
    fn evaluate(&self, summary: &SummaryTable, thresholds: &ThresholdSet) -> Result<Option<Verdict>> {
        let verdict = match self {
            VerdictInput::None => return Ok(None),
            VerdictInput::VoltageBand => {
                let percentiles = summary.percentiles(typical_voltage_columns())?;
                Verdict::VoltageBand(evaluate_voltage_band(
                    &percentiles,
                    &thresholds.voltage_band.as_limits(),
                )?)
            }
            VerdictInput::Current => {
                let phase = summary.percentiles(typical_current_columns())?;
                let neutral = summary.percentiles(neutral_current_columns())?;
                Verdict::Current(evaluate_current(&phase, &neutral, thresholds.nominal_current)?)
            }
            VerdictInput::Unbalance(reference) => {
                let percentile = summary.percentiles(&[derived_columns::UNBALANCE])?[0].value;
                Verdict::Unbalance(evaluate_unbalance(percentile, *reference))
            }
            VerdictInput::VoltageDistortion => {
                let percentiles = summary.percentiles(voltage_thd_columns())?;
                Verdict::VoltageDistortion(evaluate_voltage_distortion(
                    &percentiles,
                    thresholds.voltage_distortion_ref,
                ))
            }
            VerdictInput::CurrentHarmonics => {
                let limits = demand_limits(thresholds)?.harmonic_limits;
                let percentiles = summary.percentiles(&columns::CURRENT_HARMONICS)?;
                let (low, high) = partition_harmonic_orders(&percentiles)?;
                Verdict::CurrentHarmonics(evaluate_current_harmonics(
                    &low,
                    &high,
                    &[limits.band_0_10, limits.band_11_16],
                )?)
            }
            VerdictInput::Tdd => {
                let tdd_limit = demand_limits(thresholds)?.tdd_limit;
                let percentiles = summary.percentiles(&derived_columns::TDD)?;
                Verdict::Tdd(evaluate_tdd(&percentiles, tdd_limit))
            }
        };
        Ok(Some(verdict))
    }
}

fn demand_limits(thresholds: &ThresholdSet) -> Result<DemandLimits> {
    thresholds.demand.ok_or_else(|| {
        PqError::configuration("demand limits require the maximum measured current")
    })
}

/// Largest value across the per-phase maximum current columns
pub fn max_measured_current(readings: &DataFrame) -> Result<f64> {
    require_columns(readings, "maximum measured current", &PHASE_MAX_CURRENT_COLUMNS)?;
    let summary = summarize_columns(readings, &PHASE_MAX_CURRENT_COLUMNS)?;
    let maxima = summary.maxima(&PHASE_MAX_CURRENT_COLUMNS)?;
    let max = maxima
        .iter()
        .map(|value| value.value)
        .fold(f64::NEG_INFINITY, f64::max);
    debug!("Maximum measured current {:.3} A", max);
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::CurrentPosition;

    fn current_readings() -> DataFrame {
        df!(
            "Fecha/hora" => ["01/02/24 10:00:00", "01/02/24 10:10:00"],
            "Corriente mn. L1" => [80.0, 90.0],
            "Corriente L1" => [100.0, 120.0],
            "Corriente mx. L1" => [110.0, 150.0],
            "Corriente mn. L2" => [80.0, 90.0],
            "Corriente L2" => [95.0, 105.0],
            "Corriente mx. L2" => [100.0, 140.0],
            "Corriente mn. L3" => [80.0, 90.0],
            "Corriente L3" => [90.0, 100.0],
            "Corriente mx. L3" => [100.0, 130.0],
            "Corriente de neutro mn." => [1.0, 2.0],
            "Corriente de neutro" => [3.0, 4.0],
            "Corriente de neutro mx." => [5.0, 6.0],
        )
        .unwrap()
    }

    #[test]
    fn test_max_measured_current_spans_phases() {
        assert_eq!(max_measured_current(&current_readings()).unwrap(), 150.0);
    }

    #[test]
    fn test_current_category_report() {
        let config = AnalysisConfig::default().with_categories(vec![Category::Current]);
        let analyzer = PowerQualityAnalyzer::new(config);
        let report = analyzer.analyze(&current_readings(), None).unwrap();

        assert_eq!(report.categories.len(), 1);
        let current = report.category(Category::Current).unwrap();
        assert_eq!(current.summary.len(), 12);
        assert!(current.derived.get_column_index("var_Limite_Corriente_Nominal").is_some());

        // nominal current of the default 75 kVA / 220 V transformer is ~196.8 A
        match current.verdict.as_ref().unwrap() {
            Verdict::Current(verdict) => {
                assert_eq!(verdict.max_phase.label, "Corriente L1");
                assert_eq!(verdict.position, CurrentPosition::Within);
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
        assert!(report.thresholds.demand.is_none());
        assert!(report.voltage_variation.is_none());
    }

    #[test]
    fn test_tdd_requires_phase_maximum_columns() {
        let config = AnalysisConfig::default().with_categories(vec![Category::TddLoading]);
        let readings = df!("Fecha/hora" => ["01/02/24 10:00:00"]).unwrap();
        let err = PowerQualityAnalyzer::new(config)
            .analyze(&readings, None)
            .unwrap_err();
        assert!(matches!(err, PqError::MissingColumns { .. }));
    }
}
