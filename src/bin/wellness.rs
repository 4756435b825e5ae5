//! Wellness CLI - Command-line interface for Synheart Wellness
//!
//! Commands:
//! - score: Score daily metrics (batch mode)
//! - sleep: Resolve one night's sleep
//! - evaluate: Evaluate a history file for decline alerts
//! - trend: Summarize trends and patterns in a history file
//! - run: Process streaming daily metrics from stdin
//! - doctor: Diagnose configuration and history files

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use synheart_wellness::anomaly::BaselineAnomalyDetector;
use synheart_wellness::config::WellnessConfig;
use synheart_wellness::pipeline::{DayScore, SleepRequest, WellnessProcessor};
use synheart_wellness::sleep::SleepSignalResolver;
use synheart_wellness::trend::TrendAndPatternAnalyzer;
use synheart_wellness::types::{Consent, DailyMetrics, DailyWellnessRecord, Trend};
use synheart_wellness::{WellnessError, PRODUCER_NAME, WELLNESS_VERSION};

/// Wellness - On-device wellness scoring and decline detection
#[derive(Parser)]
#[command(name = "wellness")]
#[command(author = "Synheart AI Inc")]
#[command(version = WELLNESS_VERSION)]
#[command(about = "Score daily wellness and watch for sustained declines", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score daily metrics (one JSON object per line)
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Resolve one night's sleep from a sensor session and interaction events
    Sleep {
        /// Request file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Evaluate a history file for decline alerts
    Evaluate {
        /// History file (JSON array of scored days, use - for stdin)
        #[arg(long)]
        history: PathBuf,
    },

    /// Summarize trends and patterns in a history file
    Trend {
        /// History file (JSON array of scored days, use - for stdin)
        #[arg(long)]
        history: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process streaming daily metrics from stdin
    Run {
        /// History file, loaded if present and saved on exit
        #[arg(long)]
        history: Option<PathBuf>,

        /// User has consented to usage tracking
        #[arg(long)]
        usage_consent: bool,

        /// Forward alerts to this backend base URL
        #[cfg(feature = "http")]
        #[arg(long)]
        forward_url: Option<String>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Diagnose configuration and history files
    Doctor {
        /// Check history file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), WellnessCliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Score {
            input,
            output_format,
        } => cmd_score(&input, output_format),

        Commands::Sleep { input } => cmd_sleep(&input, &load_config(config_path)?),

        Commands::Evaluate { history } => cmd_evaluate(&history, &load_config(config_path)?),

        Commands::Trend { history, json } => {
            cmd_trend(&history, &load_config(config_path)?, json)
        }

        Commands::Run {
            history,
            usage_consent,
            #[cfg(feature = "http")]
            forward_url,
            output_format,
            flush,
        } => {
            let processor = WellnessProcessor::new(load_config(config_path)?);
            #[cfg(feature = "http")]
            let processor = attach_forwarder(processor, forward_url);

            cmd_run(
                processor,
                history.as_deref(),
                Consent {
                    usage_tracking: usage_consent,
                },
                output_format,
                flush,
            )
        }

        Commands::Doctor { history, json } => cmd_doctor(config_path, history.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<WellnessConfig, WellnessCliError> {
    match path {
        Some(path) => Ok(WellnessConfig::from_file(path)?),
        None => Ok(WellnessConfig::default()),
    }
}

#[cfg(feature = "http")]
fn attach_forwarder(processor: WellnessProcessor, url: Option<String>) -> WellnessProcessor {
    use synheart_wellness::dispatch::{AlertDispatcher, HttpAlertForwarder, MemoryAlertStore};

    match url {
        Some(url) => processor.with_dispatcher(AlertDispatcher::new(
            Box::new(MemoryAlertStore::new()),
            Box::new(HttpAlertForwarder::new(url)),
        )),
        None => processor,
    }
}

fn read_input(path: &Path) -> Result<String, WellnessCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_history(path: &Path) -> Result<Vec<DailyWellnessRecord>, WellnessCliError> {
    let content = read_input(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn cmd_score(input: &Path, output_format: OutputFormat) -> Result<(), WellnessCliError> {
    let input_data = read_input(input)?;

    let mut scores = Vec::new();
    for (index, line) in input_data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let metrics: DailyMetrics = serde_json::from_str(trimmed).map_err(|e| {
            WellnessCliError::ParseError(format!("Line {}: {}", index + 1, e))
        })?;
        scores.push(DayScore::from_metrics(&metrics));
    }

    if scores.is_empty() {
        return Err(WellnessCliError::NoInput);
    }

    print!("{}", format_output(&scores, &output_format)?);
    Ok(())
}

fn cmd_sleep(input: &Path, config: &WellnessConfig) -> Result<(), WellnessCliError> {
    let request: SleepRequest = serde_json::from_str(&read_input(input)?)?;
    let resolver = SleepSignalResolver::new(config.sleep.clone());
    let estimate = request.resolve(&resolver);

    println!("{}", serde_json::to_string_pretty(&estimate)?);
    Ok(())
}

fn cmd_evaluate(history: &Path, config: &WellnessConfig) -> Result<(), WellnessCliError> {
    let records = read_history(history)?;
    let detector = BaselineAnomalyDetector::new(config.anomaly.clone());

    let alerts = detector.evaluate(&records);
    debug!(records = records.len(), alerts = alerts.len(), "evaluated history");

    println!("{}", serde_json::to_string_pretty(&alerts)?);
    Ok(())
}

fn cmd_trend(history: &Path, config: &WellnessConfig, json: bool) -> Result<(), WellnessCliError> {
    let records = read_history(history)?;
    let summary = TrendAndPatternAnalyzer::new(config.trend.clone()).analyze(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let label = |trend: Trend| match trend {
        Trend::Improving => "improving",
        Trend::Declining => "declining",
        Trend::Stable => "stable",
    };

    println!("Wellness Trends");
    println!("===============");
    println!("Days analyzed: {}", records.len());
    println!("Wellness:      {}", label(summary.wellness_trend));
    println!("Mood:          {}", label(summary.mood_trend));
    println!("Sleep:         {}", label(summary.sleep_trend));

    if !summary.patterns.is_empty() {
        println!("\nPatterns:");
        for pattern in &summary.patterns {
            println!("  - {}", pattern.description());
        }
    }

    Ok(())
}

fn cmd_run(
    mut processor: WellnessProcessor,
    history: Option<&Path>,
    consent: Consent,
    output_format: OutputFormat,
    flush: bool,
) -> Result<(), WellnessCliError> {
    // Load existing history if present
    if let Some(history_path) = history {
        if history_path.exists() {
            let json = fs::read_to_string(history_path)?;
            let loaded = processor.load_history(&json)?;
            debug!(days = loaded, path = %history_path.display(), "loaded history");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut reports = Vec::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let metrics: DailyMetrics = serde_json::from_str(trimmed).map_err(|e| {
            WellnessCliError::ParseError(format!("Failed to parse metrics: {}", e))
        })?;

        let report = processor.submit_metrics(metrics, consent)?;

        match output_format {
            OutputFormat::Ndjson => {
                writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
                if flush {
                    stdout.flush()?;
                }
            }
            OutputFormat::Json | OutputFormat::JsonPretty => reports.push(report),
        }
    }

    if !reports.is_empty() {
        write!(stdout, "{}", format_output(&reports, &output_format)?)?;
    }
    stdout.flush()?;

    // Save history if requested
    if let Some(history_path) = history {
        fs::write(history_path, processor.export_history()?)?;
    }

    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    history: Option<&Path>,
    json: bool,
) -> Result<(), WellnessCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();
    let mut min_days = WellnessConfig::default().anomaly.min_history_days;

    checks.push(DoctorCheck {
        name: "wellness_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Wellness version {}", WELLNESS_VERSION),
    });

    // Check configuration file if provided
    match config {
        Some(config_path) => match WellnessConfig::from_file(config_path) {
            Ok(cfg) => {
                min_days = cfg.anomaly.min_history_days;
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Configuration valid (history window {} days)",
                        cfg.history_limit_days
                    ),
                });
            }
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            }),
        },
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using built-in defaults".to_string(),
        }),
    }

    // Check history file if provided
    if let Some(history_path) = history {
        if history_path.exists() {
            match fs::read_to_string(history_path) {
                Ok(content) => match serde_json::from_str::<Vec<DailyWellnessRecord>>(&content) {
                    Ok(records) => {
                        let status = if records.len() >= min_days {
                            CheckStatus::Ok
                        } else {
                            CheckStatus::Warning
                        };
                        checks.push(DoctorCheck {
                            name: "history".to_string(),
                            status,
                            message: format!(
                                "History file valid ({} days, {} needed for anomaly detection)",
                                records.len(),
                                min_days
                            ),
                        });
                    }
                    Err(e) => checks.push(DoctorCheck {
                        name: "history".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid history JSON: {}", e),
                    }),
                },
                Err(e) => checks.push(DoctorCheck {
                    name: "history".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read history file: {}", e),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "history".to_string(),
                status: CheckStatus::Warning,
                message: "History file does not exist".to_string(),
            });
        }
    }

    // Check stdin is available (for streaming mode)
    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (streaming mode ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    checks.push(DoctorCheck {
        name: "alert_forwarding".to_string(),
        status: CheckStatus::Ok,
        message: if cfg!(feature = "http") {
            "HTTP alert forwarding available".to_string()
        } else {
            "Alerts are stored locally only (built without http feature)".to_string()
        },
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: WELLNESS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Wellness Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
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

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(WellnessCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn format_output<T: serde::Serialize>(
    records: &[T],
    format: &OutputFormat,
) -> Result<String, WellnessCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut output = String::new();
            for record in records {
                output.push_str(&serde_json::to_string(record)?);
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string(records)?)),
        OutputFormat::JsonPretty => Ok(format!("{}\n", serde_json::to_string_pretty(records)?)),
    }
}

// Error types

#[derive(Debug)]
enum WellnessCliError {
    Io(io::Error),
    Wellness(WellnessError),
    Json(serde_json::Error),
    NoInput,
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for WellnessCliError {
    fn from(e: io::Error) -> Self {
        WellnessCliError::Io(e)
    }
}

impl From<WellnessError> for WellnessCliError {
    fn from(e: WellnessError) -> Self {
        WellnessCliError::Wellness(e)
    }
}

impl From<serde_json::Error> for WellnessCliError {
    fn from(e: serde_json::Error) -> Self {
        WellnessCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WellnessCliError> for CliError {
    fn from(e: WellnessCliError) -> Self {
        match e {
            WellnessCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WellnessCliError::Wellness(e) => {
                let (code, hint) = match &e {
                    WellnessError::Config(_) => {
                        ("CONFIG_ERROR", "Run 'wellness doctor --config <path>' for details")
                    }
                    WellnessError::Storage(_) => ("STORAGE_ERROR", "Check the history file"),
                    WellnessError::AlertNotFound(_) => ("ALERT_NOT_FOUND", "Check the alert id"),
                    _ => ("WELLNESS_ERROR", "Check input format"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            WellnessCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            WellnessCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No metrics found in input".to_string(),
                hint: Some("Provide one DailyMetrics JSON object per line".to_string()),
            },
            WellnessCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            WellnessCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be a DailyMetrics JSON object".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
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
