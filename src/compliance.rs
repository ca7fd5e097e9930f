//! Compliance verdicts.
//!
//! Pure comparisons of summary statistics against limits. The verdict
//! phrases serialize in the report language of the measurement exports
//! ("SÍ CUMPLE", "FUERA", ...). Each check keeps its own strictness:
//! the voltage band treats boundary values as compliant, THD-V and TDD
//! require values strictly below the reference, and the unbalance and
//! harmonic checks flag values strictly above their limit.

use crate::constants::harmonic_order;
use crate::error::{PqError, Result};
use crate::models::LabeledValue;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! verdict_phrase {
    ($(#[$meta:meta])* $name:ident { $pass:ident => $pass_text:literal, $fail:ident => $fail_text:literal }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            #[serde(rename = $pass_text)]
            $pass,
            #[serde(rename = $fail_text)]
            $fail,
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$pass => $pass_text,
                    $name::$fail => $fail_text,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

verdict_phrase!(
    /// Plain yes/no answer
    YesNo { Yes => "SÍ", No => "NO" }
);

verdict_phrase!(
    /// Overall voltage quality
    QualityLabel { Good => "BUEN", Bad => "MAL" }
);

verdict_phrase!(
    /// Largest phase current relative to the nominal current
    CurrentPosition { Within => "DENTRO", Outside => "FUERA" }
);

verdict_phrase!(
    /// Whether a single value exceeds its reference
    Exceedance { Exceeds => "SÍ SUPERA", WithinLimit => "NO SUPERA" }
);

verdict_phrase!(
    /// Whether a single value fulfils its requirement
    Fulfilment { Complies => "SÍ CUMPLE", Fails => "NO CUMPLE" }
);

verdict_phrase!(
    /// Whether a group of values fulfils its requirement
    GroupFulfilment { Comply => "SÍ CUMPLEN", Fail => "NO CUMPLEN" }
);

verdict_phrase!(
    /// Whether a group of values exceeds its reference
    GroupExceedance { Exceed => "SÍ SUPERAN", WithinLimit => "NO SUPERAN" }
);

impl YesNo {
    fn from_bool(value: bool) -> Self {
        if value { YesNo::Yes } else { YesNo::No }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageBandVerdict {
    /// Values outside the band, in input order
    pub violations: Vec<LabeledValue>,
    /// Every value is inside the band
    pub meets: YesNo,
    /// Some value is outside the band
    pub violation_flag: YesNo,
    pub label: QualityLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentVerdict {
    pub max_phase: LabeledValue,
    pub position: CurrentPosition,
    pub max_neutral: LabeledValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnbalanceVerdict {
    pub exceeds: YesNo,
    pub exceedance: Exceedance,
    pub fulfilment: Fulfilment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistortionVerdict {
    pub fulfilment: Fulfilment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicBandVerdict {
    /// Orders 3 to 9
    pub low_order: GroupFulfilment,
    pub low_order_violations: Vec<LabeledValue>,
    /// Orders 11 and above
    pub high_order: GroupFulfilment,
    pub high_order_violations: Vec<LabeledValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TddVerdict {
    pub fulfilment: GroupFulfilment,
    pub exceedance: GroupExceedance,
}

/// Verdict of any category check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Verdict {
    VoltageBand(VoltageBandVerdict),
    Current(CurrentVerdict),
    Unbalance(UnbalanceVerdict),
    VoltageDistortion(DistortionVerdict),
    CurrentHarmonics(HarmonicBandVerdict),
    Tdd(TddVerdict),
}

impl Verdict {
    /// Whether the check passed
    pub fn passed(&self) -> bool {
        match self {
            Verdict::VoltageBand(v) => v.meets == YesNo::Yes,
            Verdict::Current(v) => v.position == CurrentPosition::Within,
            Verdict::Unbalance(v) => v.fulfilment == Fulfilment::Complies,
            Verdict::VoltageDistortion(v) => v.fulfilment == Fulfilment::Complies,
            Verdict::CurrentHarmonics(v) => {
                v.low_order == GroupFulfilment::Comply && v.high_order == GroupFulfilment::Comply
            }
            Verdict::Tdd(v) => v.fulfilment == GroupFulfilment::Comply,
        }
    }
}

fn limit_pair(limits: &[f64]) -> Result<(f64, f64)> {
    match limits {
        [first, second] => Ok((*first, *second)),
        _ => Err(PqError::InvalidLimits {
            expected: 2,
            found: limits.len(),
        }),
    }
}

/// First entry holding the largest value
fn first_max(values: &[LabeledValue]) -> Option<&LabeledValue> {
    values.iter().fold(None, |best: Option<&LabeledValue>, candidate| match best {
        Some(current) if candidate.value <= current.value => Some(current),
        _ => Some(candidate),
    })
}

/// Check values against a `[lower, upper]` band; boundary values comply
pub fn evaluate_voltage_band(values: &[LabeledValue], limits: &[f64]) -> Result<VoltageBandVerdict> {
    let (lower, upper) = limit_pair(limits)?;

    let violations: Vec<LabeledValue> = values
        .iter()
        .filter(|v| v.value < lower || v.value > upper)
        .cloned()
        .collect();

    let meets = violations.is_empty();
    Ok(VoltageBandVerdict {
        violations,
        meets: YesNo::from_bool(meets),
        violation_flag: YesNo::from_bool(!meets),
        label: if meets {
            QualityLabel::Good
        } else {
            QualityLabel::Bad
        },
    })
}

/// Compare the largest phase current with the nominal current
pub fn evaluate_current(
    phase: &[LabeledValue],
    neutral: &[LabeledValue],
    nominal_current: f64,
) -> Result<CurrentVerdict> {
    let max_phase = first_max(phase).ok_or_else(|| PqError::EmptyInput {
        what: "phase current percentiles".to_string(),
    })?;
    let max_neutral = first_max(neutral).ok_or_else(|| PqError::EmptyInput {
        what: "neutral current percentiles".to_string(),
    })?;

    let position = if max_phase.value > nominal_current {
        CurrentPosition::Outside
    } else {
        CurrentPosition::Within
    };

    Ok(CurrentVerdict {
        max_phase: max_phase.clone(),
        position,
        max_neutral: max_neutral.clone(),
    })
}

/// Compare an unbalance percentile with its reference
pub fn evaluate_unbalance(percentile: f64, reference: f64) -> UnbalanceVerdict {
    if percentile > reference {
        UnbalanceVerdict {
            exceeds: YesNo::Yes,
            exceedance: Exceedance::Exceeds,
            fulfilment: Fulfilment::Fails,
        }
    } else {
        UnbalanceVerdict {
            exceeds: YesNo::No,
            exceedance: Exceedance::WithinLimit,
            fulfilment: Fulfilment::Complies,
        }
    }
}

/// Every voltage THD value must be strictly below the reference
pub fn evaluate_voltage_distortion(values: &[LabeledValue], reference: f64) -> DistortionVerdict {
    let fulfilment = if values.iter().all(|v| v.value < reference) {
        Fulfilment::Complies
    } else {
        Fulfilment::Fails
    };
    DistortionVerdict { fulfilment }
}

/// Split harmonic percentiles into orders below 11 and orders 11 and above.
///
/// Fails with [`PqError::UnknownHarmonicOrder`] on a label with no order number.
pub fn partition_harmonic_orders(
    values: &[LabeledValue],
) -> Result<(Vec<LabeledValue>, Vec<LabeledValue>)> {
    let mut low = Vec::new();
    let mut high = Vec::new();
    for value in values {
        let order = harmonic_order(&value.label).ok_or_else(|| PqError::UnknownHarmonicOrder {
            label: value.label.clone(),
        })?;
        if order < 11 {
            low.push(value.clone());
        } else {
            high.push(value.clone());
        }
    }
    Ok((low, high))
}

/// Check low-order harmonics against `limits[0]` and high-order ones against `limits[1]`
pub fn evaluate_current_harmonics(
    low_order: &[LabeledValue],
    high_order: &[LabeledValue],
    limits: &[f64],
) -> Result<HarmonicBandVerdict> {
    let (low_limit, high_limit) = limit_pair(limits)?;

    let over = |values: &[LabeledValue], limit: f64| -> Vec<LabeledValue> {
        values.iter().filter(|v| v.value > limit).cloned().collect()
    };
    let group = |clean: bool| {
        if clean {
            GroupFulfilment::Comply
        } else {
            GroupFulfilment::Fail
        }
    };

    let low_order_violations = over(low_order, low_limit);
    let high_order_violations = over(high_order, high_limit);

    Ok(HarmonicBandVerdict {
        low_order: group(low_order_violations.is_empty()),
        low_order_violations,
        high_order: group(high_order_violations.is_empty()),
        high_order_violations,
    })
}

/// Every TDD value must be strictly below the TDD limit
pub fn evaluate_tdd(values: &[LabeledValue], reference: f64) -> TddVerdict {
    if values.iter().all(|v| v.value < reference) {
        TddVerdict {
            fulfilment: GroupFulfilment::Comply,
            exceedance: GroupExceedance::WithinLimit,
        }
    } else {
        TddVerdict {
            fulfilment: GroupFulfilment::Fail,
            exceedance: GroupExceedance::Exceed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(values: &[(&str, f64)]) -> Vec<LabeledValue> {
        values
            .iter()
            .map(|(label, value)| LabeledValue::new(*label, *value))
            .collect()
    }

    #[test]
    fn test_voltage_band_inside() {
        let values = labeled(&[("Tensin L12", 215.0), ("Tensin L23", 225.0)]);
        let verdict = evaluate_voltage_band(&values, &[198.0, 242.0]).unwrap();

        assert!(verdict.violations.is_empty());
        assert_eq!(verdict.meets, YesNo::Yes);
        assert_eq!(verdict.violation_flag, YesNo::No);
        assert_eq!(verdict.label, QualityLabel::Good);
    }

    #[test]
    fn test_voltage_band_violation_and_boundaries() {
        let values = labeled(&[("Tensin L12", 215.0), ("Tensin L23", 250.0)]);
        let verdict = evaluate_voltage_band(&values, &[198.0, 242.0]).unwrap();
        assert_eq!(verdict.violations, labeled(&[("Tensin L23", 250.0)]));
        assert_eq!(verdict.meets.as_str(), "NO");
        assert_eq!(verdict.violation_flag.as_str(), "SÍ");
        assert_eq!(verdict.label.as_str(), "MAL");

        let edges = labeled(&[("a", 198.0), ("b", 242.0)]);
        let verdict = evaluate_voltage_band(&edges, &[198.0, 242.0]).unwrap();
        assert_eq!(verdict.label, QualityLabel::Good);
    }

    #[test]
    fn test_voltage_band_requires_two_limits() {
        let values = labeled(&[("Tensin L12", 215.0)]);
        let err = evaluate_voltage_band(&values, &[198.0, 220.0, 242.0]).unwrap_err();
        assert!(matches!(err, PqError::InvalidLimits { expected: 2, found: 3 }));
        assert!(evaluate_current_harmonics(&values, &values, &[7.0]).is_err());
    }

    #[test]
    fn test_current_outside_nominal() {
        let phase = labeled(&[
            ("Corriente L1", 120.0),
            ("Corriente L2", 140.0),
            ("Corriente L3", 90.0),
        ]);
        let neutral = labeled(&[("Corriente de neutro", 12.0), ("Corriente de neutro mx.", 30.0)]);
        let verdict = evaluate_current(&phase, &neutral, 130.0).unwrap();

        assert_eq!(verdict.max_phase, LabeledValue::new("Corriente L2", 140.0));
        assert_eq!(verdict.position, CurrentPosition::Outside);
        assert_eq!(verdict.max_neutral.value, 30.0);

        let verdict = evaluate_current(&phase, &neutral, 140.0).unwrap();
        assert_eq!(verdict.position.as_str(), "DENTRO");
    }

    #[test]
    fn test_current_ties_keep_first_and_empty_is_error() {
        let phase = labeled(&[("L1", 100.0), ("L2", 100.0)]);
        let verdict = evaluate_current(&phase, &phase, 150.0).unwrap();
        assert_eq!(verdict.max_phase.label, "L1");

        assert!(matches!(
            evaluate_current(&[], &phase, 150.0),
            Err(PqError::EmptyInput { .. })
        ));
        assert!(evaluate_current(&phase, &[], 150.0).is_err());
    }

    #[test]
    fn test_unbalance_verdicts() {
        let over = evaluate_unbalance(2.5, 2.0);
        assert_eq!(
            [over.exceeds.as_str(), over.exceedance.as_str(), over.fulfilment.as_str()],
            ["SÍ", "SÍ SUPERA", "NO CUMPLE"]
        );

        let equal = evaluate_unbalance(2.0, 2.0);
        assert_eq!(
            [equal.exceeds.as_str(), equal.exceedance.as_str(), equal.fulfilment.as_str()],
            ["NO", "NO SUPERA", "SÍ CUMPLE"]
        );
    }

    #[test]
    fn test_voltage_distortion_is_strict() {
        let values = labeled(&[("V THD/d Mx. L1", 3.0), ("V THD/d Mx. L2", 4.9)]);
        assert_eq!(
            evaluate_voltage_distortion(&values, 5.0).fulfilment,
            Fulfilment::Complies
        );

        let at_limit = labeled(&[("V THD/d Mx. L1", 5.0)]);
        assert_eq!(
            evaluate_voltage_distortion(&at_limit, 5.0).fulfilment,
            Fulfilment::Fails
        );
    }

    #[test]
    fn test_current_harmonic_bands() {
        let values = labeled(&[
            ("Arm. corriente 3 L1", 8.0),
            ("Arm. corriente 5 L1", 7.0),
            ("Arm. corriente 11 L1", 3.6),
            ("Arm. corriente 13 L1", 1.0),
        ]);
        let (low, high) = partition_harmonic_orders(&values).unwrap();
        assert_eq!(low.len(), 2);
        assert_eq!(high.len(), 2);

        let verdict = evaluate_current_harmonics(&low, &high, &[7.0, 3.5]).unwrap();
        assert_eq!(verdict.low_order, GroupFulfilment::Fail);
        assert_eq!(verdict.low_order_violations, labeled(&[("Arm. corriente 3 L1", 8.0)]));
        assert_eq!(verdict.high_order.as_str(), "NO CUMPLEN");
        assert_eq!(verdict.high_order_violations.len(), 1);

        let verdict = evaluate_current_harmonics(&low, &high, &[10.0, 4.5]).unwrap();
        assert!(Verdict::CurrentHarmonics(verdict).passed());
    }

    #[test]
    fn test_harmonic_label_without_order_is_rejected() {
        let values = labeled(&[("Arm. corriente 3 L1", 2.0), ("Arm. corriente L1", 1.0)]);
        match partition_harmonic_orders(&values).unwrap_err() {
            PqError::UnknownHarmonicOrder { label } => assert_eq!(label, "Arm. corriente L1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tdd_verdicts() {
        let values = labeled(&[("resultado_TDD_L1", 4.0), ("resultado_TDD_L2", 7.9)]);
        let verdict = evaluate_tdd(&values, 8.0);
        assert_eq!(verdict.fulfilment.as_str(), "SÍ CUMPLEN");
        assert_eq!(verdict.exceedance.as_str(), "NO SUPERAN");

        let verdict = evaluate_tdd(&values, 7.9);
        assert_eq!(verdict.fulfilment, GroupFulfilment::Fail);
        assert_eq!(verdict.exceedance, GroupExceedance::Exceed);
    }

    #[test]
    fn test_verdicts_serialize_as_phrases() {
        let verdict = Verdict::Unbalance(evaluate_unbalance(1.0, 2.0));
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["check"], "unbalance");
        assert_eq!(json["exceeds"], "NO");
        assert_eq!(json["fulfilment"], "SÍ CUMPLE");
        assert!(verdict.passed());
    }
}
