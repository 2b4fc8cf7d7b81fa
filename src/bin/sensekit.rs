//! SenseKit CLI - Command-line interface for the SenseKit sensor registry
//!
//! Commands:
//! - kinds: List supported sensor kinds
//! - header: Print the CSV header of a sensor kind
//! - config: Print the default configuration of a sensor kind
//! - replay: Feed a recorded event log through a registry and print the readings
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use flexi_logger::{FlexiLoggerError, Logger};
use log::{info, warn};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use sensekit::data::csv_header;
use sensekit::{
    InMemoryPlatform, PlatformEvent, RegistryConfig, SensorConfiguration, SensorDataListener,
    SensorError, SensorKind, SensorReading, SensorRegistry, SENSEKIT_VERSION,
};

/// SenseKit - Uniform registration and subscription API over device sensors
#[derive(Parser)]
#[command(name = "sensekit")]
#[command(version = SENSEKIT_VERSION)]
#[command(about = "Inspect sensor kinds and replay recorded sensor events", long_about = None)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported sensor kinds
    Kinds {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the CSV header of a sensor kind
    Header {
        /// Sensor kind (e.g. accelerometer, battery)
        kind: String,
    },

    /// Print the default configuration of a sensor kind
    Config {
        /// Sensor kind (e.g. location, audio_level)
        kind: String,
    },

    /// Replay a recorded event log through a registry
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Registry configuration file (JSON); defaults to every kind in the log
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only output readings of this kind
        #[arg(long)]
        kind: Option<String>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a registry configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one reading per line)
    Ndjson,
    /// CSV rows preceded by the kind's header (single kind only)
    Csv,
}

/// One line of a replay log
#[derive(serde::Deserialize)]
struct ReplayRecord {
    kind: SensorKind,
    #[serde(flatten)]
    event: PlatformEvent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _logger = match init_logging(&cli.log_level) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(SenseKitCliError::Logger(e))).unwrap_or_else(|_| "Unknown error".to_string()));
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) -> Result<flexi_logger::LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(level)?.log_to_stderr().start()
}

fn run(cli: Cli) -> Result<(), SenseKitCliError> {
    match cli.command {
        Commands::Kinds { json } => cmd_kinds(json),
        Commands::Header { kind } => cmd_header(&kind),
        Commands::Config { kind } => cmd_config(&kind),
        Commands::Replay {
            input,
            output,
            config,
            kind,
            output_format,
        } => cmd_replay(
            &input,
            &output,
            config.as_deref(),
            kind.as_deref(),
            output_format,
        ),
        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_kinds(json: bool) -> Result<(), SenseKitCliError> {
    let kinds: Vec<KindInfo> = SensorKind::ALL
        .iter()
        .map(|kind| KindInfo {
            kind: kind.as_str(),
            name: kind.display_name(),
            family: kind.family().as_str(),
            permissions: kind
                .required_permissions()
                .iter()
                .map(|p| p.as_str())
                .collect(),
            csv_header: csv_header(*kind),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&kinds)?);
    } else {
        for info in &kinds {
            println!("{:<22} {:<12} {}", info.kind, info.family, info.csv_header);
        }
    }

    Ok(())
}

fn cmd_header(kind: &str) -> Result<(), SenseKitCliError> {
    let kind = SensorKind::from_str(kind)?;
    println!("{}", csv_header(kind));
    Ok(())
}

fn cmd_config(kind: &str) -> Result<(), SenseKitCliError> {
    let kind = SensorKind::from_str(kind)?;
    let config = SensorConfiguration::default_for(kind);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    only: Option<&str>,
    output_format: OutputFormat,
) -> Result<(), SenseKitCliError> {
    let input_data = read_input(input)?;
    let records = parse_records(&input_data)?;

    if records.is_empty() {
        return Err(SenseKitCliError::NoEvents);
    }

    let only = only.map(SensorKind::from_str).transpose()?;

    let mut registry = SensorRegistry::new(InMemoryPlatform::new());

    // Register from the configuration file, or every kind seen in the log
    match config {
        Some(path) => {
            let registry_config = RegistryConfig::from_json(&fs::read_to_string(path)?)?;
            for sensor in registry_config.sensors {
                registry.register_with_configuration(sensor.kind, sensor)?;
            }
        }
        None => {
            for record in &records {
                if !registry.is_registered(record.kind) {
                    registry.register(record.kind)?;
                }
            }
        }
    }

    let kinds: Vec<SensorKind> = registry
        .registered_kinds()
        .into_iter()
        .filter(|kind| only.map_or(true, |only| only == *kind))
        .collect();

    if matches!(output_format, OutputFormat::Csv) && kinds.len() != 1 {
        return Err(SenseKitCliError::MixedKinds(kinds.len()));
    }

    let (tx, rx) = std::sync::mpsc::channel();
    for kind in &kinds {
        registry.subscribe(*kind, SensorDataListener::forwarding(tx.clone()))?;
    }
    drop(tx);

    registry.start_all()?;

    let mut rejected = 0usize;
    for (index, record) in records.iter().enumerate() {
        if let Err(e) = registry.dispatch(record.kind, &record.event) {
            warn!("Skipping event {}: {}", index + 1, e);
            rejected += 1;
        }
    }

    registry.stop_all()?;
    for kind in registry.registered_kinds() {
        registry.deregister(kind)?;
    }

    let readings: Vec<SensorReading> = rx.try_iter().collect();
    info!(
        "Replayed {} events into {} readings ({} rejected)",
        records.len(),
        readings.len(),
        rejected
    );

    let output_data = match output_format {
        OutputFormat::Ndjson => format_ndjson(&readings)?,
        OutputFormat::Csv => format_csv(kinds[0], &readings),
    };

    if output.to_string_lossy() == "-" {
        let mut stdout = io::stdout();
        write!(stdout, "{}", output_data)?;
        stdout.flush()?;
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), SenseKitCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "sensekit_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("SenseKit version {}", SENSEKIT_VERSION),
    });

    checks.push(DoctorCheck {
        name: "sensor_kinds".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} sensor kinds supported", SensorKind::ALL.len()),
    });

    // Check registry configuration file if provided
    if let Some(config_path) = config {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match RegistryConfig::from_json(&content) {
                    Ok(registry_config) => {
                        checks.push(check_registry_config(&registry_config));
                    }
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "config".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Invalid configuration JSON: {}", e),
                        });
                    }
                },
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read configuration file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Configuration file does not exist".to_string(),
            });
        }
    }

    // Check stdin is available (for replay from a pipe)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (replay from stdin ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        version: SENSEKIT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("SenseKit Doctor Report");
        println!("======================");
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SenseKitCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, SenseKitCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(input: &str) -> Result<Vec<ReplayRecord>, SenseKitCliError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line.trim()).map_err(|e| {
                SenseKitCliError::ParseError(format!("Failed to parse event on line {}: {}", index + 1, e))
            })
        })
        .collect()
}

fn check_registry_config(config: &RegistryConfig) -> DoctorCheck {
    let mut registry = SensorRegistry::new(InMemoryPlatform::new());
    let errors: Vec<String> = config
        .sensors
        .iter()
        .filter_map(|sensor| {
            registry
                .register_with_configuration(sensor.kind, sensor.clone())
                .err()
                .map(|e| e.to_string())
        })
        .collect();

    if errors.is_empty() {
        DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!("Configuration valid ({} sensors)", config.sensors.len()),
        }
    } else {
        DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: errors.join("; "),
        }
    }
}

fn format_ndjson(readings: &[SensorReading]) -> Result<String, SenseKitCliError> {
    let mut lines: Vec<String> = Vec::new();
    for reading in readings {
        lines.push(serde_json::to_string(reading)?);
    }
    Ok(lines.join("\n") + "\n")
}

fn format_csv(kind: SensorKind, readings: &[SensorReading]) -> String {
    let mut lines: Vec<String> = vec![csv_header(kind).to_string()];
    lines.extend(
        readings
            .iter()
            .map(SensorReading::csv_row)
            .filter(|row| !row.is_empty()),
    );
    lines.join("\n") + "\n"
}

// Error types

#[derive(Debug)]
enum SenseKitCliError {
    Io(io::Error),
    Sensor(SensorError),
    Json(serde_json::Error),
    Logger(FlexiLoggerError),
    NoEvents,
    MixedKinds(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for SenseKitCliError {
    fn from(e: io::Error) -> Self {
        SenseKitCliError::Io(e)
    }
}

impl From<SensorError> for SenseKitCliError {
    fn from(e: SensorError) -> Self {
        SenseKitCliError::Sensor(e)
    }
}

impl From<serde_json::Error> for SenseKitCliError {
    fn from(e: serde_json::Error) -> Self {
        SenseKitCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SenseKitCliError> for CliError {
    fn from(e: SenseKitCliError) -> Self {
        match e {
            SenseKitCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SenseKitCliError::Sensor(SensorError::UnknownSensorKind(name)) => CliError {
                code: "UNKNOWN_SENSOR".to_string(),
                message: format!("Unknown sensor kind: {}", name),
                hint: Some("Run 'sensekit kinds' for the list of sensor kinds".to_string()),
            },
            SenseKitCliError::Sensor(e) => CliError {
                code: "SENSOR_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            SenseKitCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SenseKitCliError::Logger(e) => CliError {
                code: "LOGGER_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the --log-level or RUST_LOG value".to_string()),
            },
            SenseKitCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            SenseKitCliError::MixedKinds(count) => CliError {
                code: "MIXED_KINDS".to_string(),
                message: format!("CSV output needs exactly one sensor kind, found {}", count),
                hint: Some("Use --kind to select one sensor".to_string()),
            },
            SenseKitCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            SenseKitCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be a JSON object with kind, timestamp and payload".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct KindInfo {
    kind: &'static str,
    name: &'static str,
    family: &'static str,
    permissions: Vec<&'static str>,
    csv_header: &'static str,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
