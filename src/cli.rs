//! Command-line interface components.

use crate::analyzer::{AnalysisReport, CategoryReport, PowerQualityAnalyzer};
use crate::compliance::Verdict;
use crate::config::AnalysisConfig;
use crate::models::{Category, LabeledValue};
use crate::prepare::fill_missing_with_mean;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "pq-analyzer")]
#[command(about = "Analyze three-phase power-quality exports: statistics and compliance verdicts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// CSV export with the interval readings
    #[arg(value_name = "READINGS_CSV")]
    pub readings: PathBuf,

    /// CSV export with hour-by-hour energy readings
    #[arg(long, value_name = "CSV")]
    pub hourly: Option<PathBuf>,

    /// TOML configuration file (defaults to <config dir>/pq-analyzer/config.toml when present)
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Nominal line-to-line voltage (V)
    #[arg(long, value_name = "V")]
    pub nominal_voltage: Option<f64>,

    /// Transformer capacity (VA)
    #[arg(long, value_name = "VA")]
    pub transformer_capacity: Option<f64>,

    /// Transformer short-circuit impedance (%)
    #[arg(long, value_name = "PCT")]
    pub impedance: Option<f64>,

    /// Voltage unbalance reference (%)
    #[arg(long, value_name = "PCT")]
    pub voltage_unbalance_ref: Option<f64>,

    /// Current unbalance reference (%)
    #[arg(long, value_name = "PCT")]
    pub current_unbalance_ref: Option<f64>,

    /// Voltage THD reference (%)
    #[arg(long, value_name = "PCT")]
    pub distortion_ref: Option<f64>,

    /// Comma-separated categories to analyze (default: all)
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub categories: Vec<Category>,

    /// CSV field separator
    #[arg(long, default_value_t = ',')]
    pub separator: char,

    /// Fill missing numeric cells with the column mean before analysis
    #[arg(long)]
    pub fill_missing: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Untimed, uncolored log lines for quiet runs and JSON output
    pub fn plain_logs(&self) -> bool {
        self.quiet || self.format == OutputFormat::Json
    }

    /// Separator as the single byte the CSV reader expects
    pub fn separator_byte(&self) -> Result<u8> {
        if !self.separator.is_ascii() {
            anyhow::bail!("Separator must be a single ASCII character, got '{}'", self.separator);
        }
        Ok(self.separator as u8)
    }
}

/// Run the analyzer end to end and print the report
pub fn run(args: Args) -> Result<AnalysisReport> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let config = load_configuration(&args)?;
    debug!("Loaded configuration: {:?}", config);

    let separator = args.separator_byte()?;
    let mut readings = read_csv(&args.readings, separator)?;
    let mut hourly = match &args.hourly {
        Some(path) => Some(read_csv(path, separator)?),
        None => None,
    };

    if args.fill_missing {
        readings = fill_missing_with_mean(&readings)?;
        hourly = hourly.as_ref().map(fill_missing_with_mean).transpose()?;
    }

    let analyzer = PowerQualityAnalyzer::new(config);
    let report = analyzer
        .analyze(&readings, hourly.as_ref())
        .context("Analysis failed")?;

    match args.format {
        OutputFormat::Human => print_report(&report),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
    }

    Ok(report)
}

/// Log lines go to stderr so a JSON report on stdout stays parseable.
///
/// JSON runs and quiet runs get plain, untimed lines; verbose runs also name
/// the module that logged, since per-category builders log under their own
/// targets.
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("pq_analyzer={}", log_level)))
        .context("Invalid log filter")?;

    let layer = fmt::layer()
        .with_target(args.verbose)
        .with_level(true)
        .with_writer(std::io::stderr);

    let initialized = if args.plain_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_ansi(false).without_time().compact())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_timer(fmt::time::uptime()))
            .try_init()
    };
    initialized.context("Failed to initialize logging")?;

    debug!(
        "Logging initialized at level {} for {:?} output",
        log_level, args.format
    );
    Ok(())
}

/// Load configuration: file (explicit or default location), then CLI overrides
pub fn load_configuration(args: &Args) -> Result<AnalysisConfig> {
    let default_path = match &args.config {
        Some(_) => None,
        None => AnalysisConfig::default_config_path().ok(),
    };

    let config_file = match &args.config {
        Some(path) => Some(path.as_path()),
        None => default_path
            .as_ref()
            .filter(|path| path.exists())
            .map(|path| path.as_path()),
    };

    let mut config = match config_file {
        Some(path) => {
            info!("Using config file: {}", path.display());
            AnalysisConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?
        }
        None => {
            debug!("No config file found, using defaults");
            AnalysisConfig::default()
        }
    };

    apply_cli_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut AnalysisConfig, args: &Args) {
    if let Some(value) = args.nominal_voltage {
        config.nominal_voltage = value;
    }
    if let Some(value) = args.transformer_capacity {
        config.transformer_capacity = value;
    }
    if let Some(value) = args.impedance {
        config.short_circuit_impedance_pct = value;
    }
    if let Some(value) = args.voltage_unbalance_ref {
        config.voltage_unbalance_ref = value;
    }
    if let Some(value) = args.current_unbalance_ref {
        config.current_unbalance_ref = value;
    }
    if let Some(value) = args.distortion_ref {
        config.voltage_distortion_ref = value;
    }
    if !args.categories.is_empty() {
        config.categories = args.categories.clone();
    }
}

/// Read a measurement export; timestamps stay text
pub fn read_csv(path: &Path, separator: u8) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// One-line description of a verdict, in the report's phrases
pub fn describe_verdict(verdict: &Verdict) -> String {
    fn values(values: &[LabeledValue]) -> String {
        values
            .iter()
            .map(|v| format!("{} = {:.3}", v.label, v.value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    match verdict {
        Verdict::VoltageBand(v) if v.violations.is_empty() => {
            format!("{} / {} ({})", v.meets, v.violation_flag, v.label)
        }
        Verdict::VoltageBand(v) => format!(
            "{} / {} ({}): {}",
            v.meets,
            v.violation_flag,
            v.label,
            values(&v.violations)
        ),
        Verdict::Current(v) => format!(
            "{} (max {} = {:.3}, neutral {} = {:.3})",
            v.position, v.max_phase.label, v.max_phase.value, v.max_neutral.label, v.max_neutral.value
        ),
        Verdict::Unbalance(v) => format!("{} / {} / {}", v.exceeds, v.exceedance, v.fulfilment),
        Verdict::VoltageDistortion(v) => v.fulfilment.to_string(),
        Verdict::CurrentHarmonics(v) => {
            let mut text = format!("3-9: {}, 11+: {}", v.low_order, v.high_order);
            if !v.low_order_violations.is_empty() {
                text.push_str(&format!(" [{}]", values(&v.low_order_violations)));
            }
            if !v.high_order_violations.is_empty() {
                text.push_str(&format!(" [{}]", values(&v.high_order_violations)));
            }
            text
        }
        Verdict::Tdd(v) => format!("{} / {}", v.fulfilment, v.exceedance),
    }
}

fn print_category(report: &CategoryReport) {
    println!();
    println!("{}", report.category.title().bright_cyan().bold());

    if let Some(verdict) = &report.verdict {
        let status = if verdict.passed() {
            "PASS".bright_green().bold()
        } else {
            "FAIL".bright_red().bold()
        };
        println!("  {} {}", status, describe_verdict(verdict));
    }

    for entry in report.summary.iter() {
        let [p95, mean, min, max] = entry.stats.as_array();
        println!(
            "  {:<32} {} {:>10.3}  {} {:>10.3}  {} {:>10.3}  {} {:>10.3}",
            entry.column,
            "p95".bright_black(),
            p95,
            "mean".bright_black(),
            mean,
            "min".bright_black(),
            min,
            "max".bright_black(),
            max
        );
    }

    if let Some(grouped) = &report.grouped {
        for (bucket, table) in grouped.iter() {
            for entry in table.iter() {
                println!(
                    "  {:<32} {} {:>10.3}  {} {:>10.3}",
                    bucket.label(),
                    "p95".bright_black(),
                    entry.stats.percentile_95,
                    "mean".bright_black(),
                    entry.stats.mean
                );
            }
        }
    }
}

/// Print the human-readable report to stdout
pub fn print_report(report: &AnalysisReport) {
    let thresholds = &report.thresholds;

    println!("{}", "Power-quality analysis".bright_green().bold());
    println!(
        "  Nominal voltage {:.1} V, band {:.1} - {:.1} V",
        thresholds.nominal_voltage, thresholds.voltage_band.lower, thresholds.voltage_band.upper
    );
    println!(
        "  Nominal current {:.3} A, short-circuit current {:.3} kA",
        thresholds.nominal_current, thresholds.short_circuit_current
    );
    if let Some(demand) = &thresholds.demand {
        println!(
            "  ISC/IL {:.3} (max current {:.3} A), TDD limit {}%",
            demand.isc_over_il, demand.max_measured_current, demand.tdd_limit
        );
    }
    if let Some(variation) = &report.voltage_variation {
        for value in variation {
            println!("  Variation {}: {:+.3}%", value.label, value.value);
        }
    }
    if let Some(load) = &report.loadability {
        println!(
            "  Loadability {:.3}%, headroom {:.3}%",
            load.loadability_pct, load.headroom_pct
        );
    }

    for category in &report.categories {
        print_category(category);
    }

    let failed = report.failed_checks();
    println!();
    if failed == 0 {
        println!("{}", "All checks passed".bright_green().bold());
    } else {
        println!("{}", format!("{} check(s) failed", failed).bright_red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::evaluate_unbalance;

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::try_parse_from([
            "pq-analyzer",
            "readings.csv",
            "--nominal-voltage",
            "440",
            "--categories",
            "voltage,tdd-loading",
            "--separator",
            ";",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.nominal_voltage, Some(440.0));
        assert_eq!(args.categories, vec![Category::Voltage, Category::TddLoading]);
        assert_eq!(args.separator_byte().unwrap(), b';');
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.get_log_level(), "debug");
        assert!(args.plain_logs());

        let mut config = AnalysisConfig::default();
        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.nominal_voltage, 440.0);
        assert_eq!(config.categories.len(), 2);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let result = Args::try_parse_from(["pq-analyzer", "r.csv", "--categories", "frequency"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["pq-analyzer", "r.csv", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_human_output_keeps_timed_logs() {
        let args = Args::try_parse_from(["pq-analyzer", "r.csv"]).unwrap();
        assert_eq!(args.get_log_level(), "info");
        assert!(!args.plain_logs());

        let args = Args::try_parse_from(["pq-analyzer", "r.csv", "-q"]).unwrap();
        assert_eq!(args.get_log_level(), "warn");
        assert!(args.plain_logs());
    }

    #[test]
    fn test_read_semicolon_csv() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("readings.csv");
        std::fs::write(
            &path,
            "Fecha/hora;Corriente L1\n01/02/24 10:00:00;10.5\n01/02/24 10:10:00;11.5\n",
        )
        .unwrap();

        let df = read_csv(&path, b';').unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("Fecha/hora").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_verdict_description_uses_phrases() {
        let text = describe_verdict(&Verdict::Unbalance(evaluate_unbalance(3.0, 2.0)));
        assert_eq!(text, "SÍ / SÍ SUPERA / NO CUMPLE");
    }
}
