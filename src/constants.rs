//! Application constants for the power-quality analyzer
//!
//! Column names exactly as the meter export writes them (source locale,
//! accents already stripped by the exporter), derived column names,
//! the timestamp format and the default reference values.

// =============================================================================
// Timestamp Handling
// =============================================================================

/// Textual timestamp column present in every export
pub const TIMESTAMP_COLUMN: &str = "Fecha/hora";

/// Parsed datetime column added by every derived-column builder
pub const PARSED_TIMESTAMP_COLUMN: &str = "fecha_y_Hora";

/// Export timestamp layout: day/month/2-digit-year hour:minute:second
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%y %H:%M:%S";

// =============================================================================
// Statistics
// =============================================================================

/// Percentile used as the representative "worst typical" value
pub const SUMMARY_PERCENTILE: f64 = 95.0;

/// Row labels of the transposed summary table
pub const STATISTIC_LABELS: [&str; 4] = ["Percentil", "Media", "Min", "Max"];

/// Header of the label column in the transposed summary table
pub const STATISTIC_COLUMN: &str = "Estadistico";

/// Decimal places kept by the energy builder
pub const ENERGY_ROUNDING_DECIMALS: u32 = 3;

/// Constant reference column value attached by the energy builder
pub const ENERGY_REFERENCE_KWH: f64 = 100.0;

// =============================================================================
// Default Reference Values
// =============================================================================

/// Default voltage unbalance reference (%)
pub const DEFAULT_VOLTAGE_UNBALANCE_REF: f64 = 2.0;

/// Default current unbalance reference (%)
pub const DEFAULT_CURRENT_UNBALANCE_REF: f64 = 10.0;

/// Default voltage THD reference (%)
pub const DEFAULT_VOLTAGE_DISTORTION_REF: f64 = 5.0;

/// Tolerance band around nominal voltage (fraction)
pub const VOLTAGE_BAND_TOLERANCE: f64 = 0.10;

// =============================================================================
// Raw Column Names
// =============================================================================

/// Raw measurement columns written by the meter export
pub mod columns {
    // Line-to-line voltages
    pub const VOLTAGE_MIN_L12: &str = "Tensin mn. L12";
    pub const VOLTAGE_L12: &str = "Tensin L12";
    pub const VOLTAGE_MAX_L12: &str = "Tensin mx. L12";
    pub const VOLTAGE_MIN_L23: &str = "Tensin mn. L23";
    pub const VOLTAGE_L23: &str = "Tensin L23";
    pub const VOLTAGE_MAX_L23: &str = "Tensin mx. L23";
    pub const VOLTAGE_MIN_L31: &str = "Tensin mn. L31";
    pub const VOLTAGE_L31: &str = "Tensin L31";
    pub const VOLTAGE_MAX_L31: &str = "Tensin mx. L31";

    // Phase and neutral currents
    pub const CURRENT_MIN_L1: &str = "Corriente mn. L1";
    pub const CURRENT_L1: &str = "Corriente L1";
    pub const CURRENT_MAX_L1: &str = "Corriente mx. L1";
    pub const CURRENT_MIN_L2: &str = "Corriente mn. L2";
    pub const CURRENT_L2: &str = "Corriente L2";
    pub const CURRENT_MAX_L2: &str = "Corriente mx. L2";
    pub const CURRENT_MIN_L3: &str = "Corriente mn. L3";
    pub const CURRENT_L3: &str = "Corriente L3";
    pub const CURRENT_MAX_L3: &str = "Corriente mx. L3";
    pub const NEUTRAL_CURRENT_MIN: &str = "Corriente de neutro mn.";
    pub const NEUTRAL_CURRENT: &str = "Corriente de neutro";
    pub const NEUTRAL_CURRENT_MAX: &str = "Corriente de neutro mx.";

    // Three-phase powers
    pub const ACTIVE_POWER_MIN: &str = "P.Activa mn. III";
    pub const ACTIVE_POWER: &str = "P.Activa III";
    pub const ACTIVE_POWER_MAX: &str = "P.Activa mx. III";
    pub const CAPACITIVE_POWER_MIN: &str = "P.Capacitiva mn. III";
    pub const CAPACITIVE_POWER: &str = "P.Capacitiva III";
    pub const CAPACITIVE_POWER_MAX: &str = "P.Capacitiva mx. III";
    pub const INDUCTIVE_POWER_MIN: &str = "P.Inductiva mn. III";
    pub const INDUCTIVE_POWER: &str = "P.Inductiva III";
    pub const INDUCTIVE_POWER_MAX: &str = "P.Inductiva mx. III";
    pub const APPARENT_POWER_MIN: &str = "P.Aparente mn. III";
    pub const APPARENT_POWER: &str = "P.Aparente III";
    pub const APPARENT_POWER_MAX: &str = "P.Aparente mx. III";

    // Power factor (signed variants and the trailing-dash magnitude variants)
    pub const POWER_FACTOR_MIN: &str = "F.P. Mn. III";
    pub const POWER_FACTOR: &str = "F.P. III";
    pub const POWER_FACTOR_MAX: &str = "F.P. Mx. III";
    pub const POWER_FACTOR_MIN_DASH: &str = "F.P. Mn. III -";
    pub const POWER_FACTOR_DASH: &str = "F.P. III -";
    pub const POWER_FACTOR_MAX_DASH: &str = "F.P. Mx. III -";

    // Distortion
    pub const VOLTAGE_THD_MAX_L1: &str = "V THD/d Mx. L1";
    pub const VOLTAGE_THD_MAX_L2: &str = "V THD/d Mx. L2";
    pub const VOLTAGE_THD_MAX_L3: &str = "V THD/d Mx. L3";
    pub const CURRENT_THD_L1: &str = "A THD/d L1";
    pub const CURRENT_THD_L2: &str = "A THD/d L2";
    pub const CURRENT_THD_L3: &str = "A THD/d L3";

    // K-factor
    pub const K_FACTOR_MIN_L1: &str = "Factor K mn. L1";
    pub const K_FACTOR_L1: &str = "Factor K L1";
    pub const K_FACTOR_MAX_L1: &str = "Factor K mx. L1";
    pub const K_FACTOR_MIN_L2: &str = "Factor K mn. L2";
    pub const K_FACTOR_L2: &str = "Factor K L2";
    pub const K_FACTOR_MAX_L2: &str = "Factor K mx. L2";
    pub const K_FACTOR_MIN_L3: &str = "Factor K mn. L3";
    pub const K_FACTOR_L3: &str = "Factor K L3";
    pub const K_FACTOR_MAX_L3: &str = "Factor K mx. L3";

    // Tariff-1 energy counters
    pub const ACTIVE_ENERGY: &str = "E.Activa T1";
    pub const CAPACITIVE_ENERGY: &str = "E.Capacitiva T1";
    pub const INDUCTIVE_ENERGY: &str = "E.Inductiva T1";

    /// Individual voltage harmonics, phase-major, orders 3..=15 (odd)
    pub const VOLTAGE_HARMONICS: [&str; 21] = [
        "Arm. tensin 3 L1",
        "Arm. tensin 5 L1",
        "Arm. tensin 7 L1",
        "Arm. tensin 9 L1",
        "Arm. tensin 11 L1",
        "Arm. tensin 13 L1",
        "Arm. tensin 15 L1",
        "Arm. tensin 3 L2",
        "Arm. tensin 5 L2",
        "Arm. tensin 7 L2",
        "Arm. tensin 9 L2",
        "Arm. tensin 11 L2",
        "Arm. tensin 13 L2",
        "Arm. tensin 15 L2",
        "Arm. tensin 3 L3",
        "Arm. tensin 5 L3",
        "Arm. tensin 7 L3",
        "Arm. tensin 9 L3",
        "Arm. tensin 11 L3",
        "Arm. tensin 13 L3",
        "Arm. tensin 15 L3",
    ];

    /// Individual current harmonics, phase-major, orders 3..=15 (odd)
    pub const CURRENT_HARMONICS: [&str; 21] = [
        "Arm. corriente 3 L1",
        "Arm. corriente 5 L1",
        "Arm. corriente 7 L1",
        "Arm. corriente 9 L1",
        "Arm. corriente 11 L1",
        "Arm. corriente 13 L1",
        "Arm. corriente 15 L1",
        "Arm. corriente 3 L2",
        "Arm. corriente 5 L2",
        "Arm. corriente 7 L2",
        "Arm. corriente 9 L2",
        "Arm. corriente 11 L2",
        "Arm. corriente 13 L2",
        "Arm. corriente 15 L2",
        "Arm. corriente 3 L3",
        "Arm. corriente 5 L3",
        "Arm. corriente 7 L3",
        "Arm. corriente 9 L3",
        "Arm. corriente 11 L3",
        "Arm. corriente 13 L3",
        "Arm. corriente 15 L3",
    ];
}

// =============================================================================
// Derived Column Names
// =============================================================================

/// Columns added by the derived-column builders
pub mod derived {
    // Reference lines
    pub const VOLTAGE_LOWER_LIMIT: &str = "var_Limite_Inferior_Tension";
    pub const NOMINAL_VOLTAGE: &str = "valor_Nominal";
    pub const VOLTAGE_UPPER_LIMIT: &str = "var_Limite_Superior_Tension";
    pub const NOMINAL_CURRENT_LIMIT: &str = "var_Limite_Corriente_Nominal";
    pub const VOLTAGE_UNBALANCE_REF: &str = "var_Ref_Desbalance_Tension";
    pub const CURRENT_UNBALANCE_REF: &str = "var_Ref_Desbalance_Corriente";
    pub const VOLTAGE_DISTORTION_REF: &str = "var_Ref_Distorsion_Tension";
    pub const TDD_LIMIT_REF: &str = "var_Ref_Limite_Cargabilidad_TDD";

    // Unbalance
    pub const AVERAGE: &str = "Promedio";
    pub const VOLTAGE_DELTAS: [&str; 3] = ["delta_V1", "delta_V2", "delta_V3"];
    pub const LARGEST_DELTA: &str = "delta_Mayor";
    pub const LARGEST_CURRENT: &str = "max_Corrientes_Medias";
    pub const UNBALANCE: &str = "Desbalance";

    // TDD loading, per phase
    pub const PHASE_MAX_CURRENT: [&str; 3] =
        ["max_Corriente_L1", "max_Corriente_L2", "max_Corriente_L3"];
    pub const LOAD_RATIO: [&str; 3] = [
        "resultado_Division_L1",
        "resultado_Division_L2",
        "resultado_Division_L3",
    ];
    pub const TDD: [&str; 3] = ["resultado_TDD_L1", "resultado_TDD_L2", "resultado_TDD_L3"];

    // Energy ratios
    pub const KWH_REFERENCE: &str = "KWH";
    pub const INDUCTIVE_RATIO: &str = "KARH_IND";
    pub const CAPACITIVE_RATIO: &str = "KVARH_CAP";
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Harmonic order encoded in a harmonic column name ("Arm. corriente 11 L2" -> 11)
pub fn harmonic_order(column_name: &str) -> Option<u32> {
    let mut parts = column_name.split_whitespace().rev();
    let _phase = parts.next()?;
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmonic_order_extraction() {
        assert_eq!(harmonic_order("Arm. corriente 11 L2"), Some(11));
        assert_eq!(harmonic_order("Arm. tensin 3 L1"), Some(3));
        assert_eq!(harmonic_order("Corriente L1"), None);
        assert_eq!(harmonic_order(""), None);
    }

    #[test]
    fn test_harmonic_lists_are_phase_major() {
        let orders: Vec<u32> = columns::CURRENT_HARMONICS
            .iter()
            .take(7)
            .filter_map(|name| harmonic_order(name))
            .collect();
        assert_eq!(orders, vec![3, 5, 7, 9, 11, 13, 15]);
        assert!(columns::VOLTAGE_HARMONICS[7].ends_with("L2"));
    }
}
