//! Reference limits derived from equipment nameplate values.
//!
//! Pure arithmetic: nominal voltage band, nominal and short-circuit
//! currents, the ISC/IL ratio and the TDD bracket it selects, the
//! individual harmonic limits per bracket, voltage variation and
//! transformer loadability.

use crate::config::AnalysisConfig;
use crate::constants::VOLTAGE_BAND_TOLERANCE;
use crate::error::{PqError, Result};
use crate::models::{HarmonicLimits, Loadability, VoltageBand};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Band of +/-10% around the nominal voltage
pub fn nominal_voltage_band(nominal: f64) -> VoltageBand {
    VoltageBand {
        lower: nominal - nominal * VOLTAGE_BAND_TOLERANCE,
        upper: nominal + nominal * VOLTAGE_BAND_TOLERANCE,
    }
}

/// Nominal current of a three-phase transformer: capacity / (sqrt(3) * V)
pub fn nominal_current(capacity: f64, nominal_voltage: f64) -> Result<f64> {
    if nominal_voltage == 0.0 {
        return Err(PqError::division_by_zero("nominal current"));
    }
    Ok(capacity / (3f64.sqrt() * nominal_voltage))
}

/// Short-circuit current in kA
pub fn short_circuit_current(nominal_current: f64, impedance_pct: f64) -> Result<f64> {
    if impedance_pct == 0.0 {
        return Err(PqError::division_by_zero("short-circuit current"));
    }
    Ok((nominal_current / (impedance_pct / 100.0)) / 1000.0)
}

/// ISC/IL ratio, with the short-circuit current given in kA
pub fn isc_over_il(short_circuit_current: f64, max_measured_current: f64) -> Result<f64> {
    if max_measured_current == 0.0 {
        return Err(PqError::division_by_zero("ISC/IL ratio"));
    }
    Ok((short_circuit_current / max_measured_current) * 1000.0)
}

/// Maximum TDD (%) allowed for a given ISC/IL ratio
pub fn tdd_limit_bracket(isc_over_il: f64) -> Result<f64> {
    if isc_over_il.is_nan() {
        return Err(PqError::NonFiniteInput {
            operation: "TDD limit bracket".to_string(),
        });
    }

    let bracket = if isc_over_il < 20.0 {
        5.0
    } else if isc_over_il < 50.0 {
        8.0
    } else if isc_over_il < 100.0 {
        12.0
    } else if isc_over_il <= 1000.0 {
        15.0
    } else {
        20.0
    };
    Ok(bracket)
}

/// Individual current-harmonic limits for a TDD bracket
pub fn harmonic_limits(tdd_bracket: f64) -> Result<HarmonicLimits> {
    let [band_0_10, band_11_16, band_17_22, band_23_34, band_35] = match tdd_bracket {
        b if b == 5.0 => [4.0, 2.0, 1.5, 0.6, 0.3],
        b if b == 8.0 => [7.0, 3.5, 2.5, 1.0, 0.5],
        b if b == 12.0 => [10.0, 4.5, 4.0, 1.5, 0.7],
        b if b == 15.0 => [12.0, 5.5, 5.0, 2.0, 1.0],
        b if b == 20.0 => [15.0, 7.0, 6.0, 2.5, 1.4],
        value => return Err(PqError::UnsupportedTddBracket { value }),
    };

    Ok(HarmonicLimits {
        band_0_10,
        band_11_16,
        band_17_22,
        band_23_34,
        band_35,
    })
}

/// Deviation of each value from nominal, in percent
pub fn voltage_variation_percent(values: &[f64], nominal: f64) -> Result<Vec<f64>> {
    if nominal == 0.0 {
        return Err(PqError::division_by_zero("voltage variation"));
    }
    Ok(values.iter().map(|v| ((v / nominal) - 1.0) * 100.0).collect())
}

/// Transformer loadability from the apparent-power percentile, and what is left
pub fn loadability_and_headroom(capacity: f64, max_apparent_percentile: f64) -> Result<Loadability> {
    if capacity == 0.0 {
        return Err(PqError::division_by_zero("transformer loadability"));
    }
    let loadability_pct = max_apparent_percentile / capacity * 100.0;
    Ok(Loadability {
        loadability_pct,
        headroom_pct: 100.0 - loadability_pct,
    })
}

/// TDD bracket and harmonic limits, known once the measured current is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandLimits {
    pub max_measured_current: f64,
    pub isc_over_il: f64,
    pub tdd_limit: f64,
    pub harmonic_limits: HarmonicLimits,
}

/// Reference limits for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub nominal_voltage: f64,
    pub voltage_band: VoltageBand,
    pub nominal_current: f64,
    /// Short-circuit current (kA)
    pub short_circuit_current: f64,
    pub voltage_unbalance_ref: f64,
    pub current_unbalance_ref: f64,
    pub voltage_distortion_ref: f64,
    pub demand: Option<DemandLimits>,
}

impl ThresholdSet {
    /// Compute the nameplate-derived limits
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let nominal_current = nominal_current(config.transformer_capacity, config.nominal_voltage)?;
        let short_circuit_current =
            short_circuit_current(nominal_current, config.short_circuit_impedance_pct)?;

        debug!(
            "Nominal current {:.3} A, short-circuit current {:.3} kA",
            nominal_current, short_circuit_current
        );

        Ok(Self {
            nominal_voltage: config.nominal_voltage,
            voltage_band: nominal_voltage_band(config.nominal_voltage),
            nominal_current,
            short_circuit_current,
            voltage_unbalance_ref: config.voltage_unbalance_ref,
            current_unbalance_ref: config.current_unbalance_ref,
            voltage_distortion_ref: config.voltage_distortion_ref,
            demand: None,
        })
    }

    /// Complete the set with the limits that depend on the measured current
    pub fn with_max_measured_current(mut self, max_measured_current: f64) -> Result<Self> {
        let ratio = isc_over_il(self.short_circuit_current, max_measured_current)?;
        let tdd_limit = tdd_limit_bracket(ratio)?;
        let harmonic_limits = harmonic_limits(tdd_limit)?;

        debug!(
            "ISC/IL {:.3} with max current {:.3} A selects TDD limit {}%",
            ratio, max_measured_current, tdd_limit
        );

        self.demand = Some(DemandLimits {
            max_measured_current,
            isc_over_il: ratio,
            tdd_limit,
            harmonic_limits,
        });
        Ok(self)
    }
}
