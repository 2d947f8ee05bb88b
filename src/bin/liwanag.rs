//! LIWANAG CLI - street-lighting dashboard views in the terminal
//!
//! Commands:
//! - overview: city-wide summary and lux category legend
//! - analytics: one card per barangay
//! - area: card and sensor table for a single barangay
//! - map: GeoJSON overlay with sensor markers and street gradients
//! - devices: device manager status table
//! - classify: lux category and color for given values
//! - doctor: diagnose configuration and data sources

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};

use liwanag::classifier::classify;
use liwanag::config::{DashboardConfig, CONFIG_ENV};
use liwanag::dashboard::Dashboard;
use liwanag::devices::{bundled_devices, parse_devices, summarize_devices};
use liwanag::error::LiwanagError;
use liwanag::map_layer::MapLayers;
use liwanag::report::{
    render_cards_text, render_detail_text, render_devices_text, render_overview_text, ReportEncoder,
};
use liwanag::source::{DataSourceKind, FixtureSource, RemoteSource};
use liwanag::store::LoadState;
use liwanag::{LIWANAG_VERSION, PRODUCER_NAME};

/// LIWANAG - street-lighting illuminance analytics
#[derive(Parser)]
#[command(name = "liwanag")]
#[command(author = "LIWANAG Project")]
#[command(version = LIWANAG_VERSION)]
#[command(about = "Analyze street-light lux readings by barangay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// City-wide summary and lux category legend
    Overview {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// One analytics card per barangay
    Analytics {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Well-lit threshold in lux (overrides config)
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Card and sensor table for one barangay
    Area {
        /// Barangay name ("Uncategorized" for readings without one)
        name: String,

        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// GeoJSON map overlay
    Map {
        #[command(flatten)]
        data: DataArgs,

        /// Hide sensor markers
        #[arg(long)]
        no_markers: bool,

        /// Hide street gradient lines
        #[arg(long)]
        no_lines: bool,

        /// Segments between consecutive readings (overrides config)
        #[arg(long)]
        steps: Option<usize>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Device manager: registered devices and their status
    Devices {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Minutes of silence before an online device is flagged (overrides config)
        #[arg(long)]
        timeout: Option<i64>,
    },

    /// Classify lux values
    Classify {
        /// Lux values
        #[arg(required = true, allow_negative_numbers = true)]
        lux: Vec<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and data sources
    Doctor {
        /// Fixture file to check
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct DataArgs {
    /// Readings JSON file (use - for stdin); defaults to the bundled sample
    #[arg(short, long, conflicts_with = "api")]
    input: Option<PathBuf>,

    /// Fetch readings from the backend instead of a file
    #[arg(long)]
    api: bool,

    /// Backend URL (overrides config)
    #[arg(long, requires = "api")]
    url: Option<String>,

    /// Config file (default: $LIWANAG_CONFIG, then ./liwanag.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Terminal cards and tables
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), LiwanagCliError> {
    match cli.command {
        Commands::Overview { data, format } => {
            let dashboard = load_dashboard(&data, |_| {}).await?;
            let overview = dashboard.overview();
            match format {
                OutputFormat::Text => print!("{}", render_overview_text(&overview)),
                OutputFormat::Json => println!("{}", serde_json::to_string(&overview)?),
                OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&overview)?),
            }
            Ok(())
        }

        Commands::Analytics {
            data,
            format,
            threshold,
        } => {
            let dashboard = load_dashboard(&data, |config| {
                if let Some(threshold) = threshold {
                    config.well_lit_threshold = threshold;
                }
            })
            .await?;

            match format {
                OutputFormat::Text => print!("{}", render_cards_text(&dashboard.area_cards())),
                OutputFormat::Json => {
                    println!("{}", ReportEncoder::new().encode_to_json(&dashboard, false)?)
                }
                OutputFormat::JsonPretty => {
                    println!("{}", ReportEncoder::new().encode_to_json(&dashboard, true)?)
                }
            }
            Ok(())
        }

        Commands::Area { name, data, format } => {
            let mut dashboard = load_dashboard(&data, |_| {}).await?;
            dashboard.select_area(&name)?;
            let detail = dashboard.area_detail(&name)?;
            match format {
                OutputFormat::Text => print!("{}", render_detail_text(&detail)),
                OutputFormat::Json => println!("{}", serde_json::to_string(&detail)?),
                OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&detail)?),
            }
            Ok(())
        }

        Commands::Map {
            data,
            no_markers,
            no_lines,
            steps,
            output,
        } => {
            let mut dashboard = load_dashboard(&data, |config| {
                if let Some(steps) = steps {
                    config.interpolation_steps = steps;
                }
            })
            .await?;
            dashboard.set_layers(MapLayers {
                markers: !no_markers,
                street_lines: !no_lines,
            });

            let geojson = serde_json::to_string_pretty(&dashboard.map_layer())?;
            match output {
                Some(path) => fs::write(path, geojson + "\n")?,
                None => println!("{geojson}"),
            }
            Ok(())
        }

        Commands::Devices {
            data,
            format,
            timeout,
        } => cmd_devices(&data, format, timeout).await,

        Commands::Classify { lux, json } => cmd_classify(&lux, json),

        Commands::Doctor { input, json } => cmd_doctor(input.as_deref(), json),
    }
}

/// Build a dashboard and run its one data load.
async fn load_dashboard(
    data: &DataArgs,
    overrides: impl FnOnce(&mut DashboardConfig),
) -> Result<Dashboard, LiwanagCliError> {
    let mut config = load_config(data)?;
    overrides(&mut config);
    config.validate()?;

    let mut dashboard = Dashboard::new(config);
    if data.api {
        dashboard.toggle_source();
    }

    let ticket = dashboard.begin_load();
    let result = match (ticket.source(), &data.input) {
        (DataSourceKind::Api, _) => {
            let url = data
                .url
                .clone()
                .unwrap_or_else(|| dashboard.config().api_url.clone());
            debug!(url = %url, "Fetching sensor data");
            match RemoteSource::new(&url) {
                Ok(source) => source.fetch().await,
                Err(e) => Err(e),
            }
        }
        (DataSourceKind::Sample, Some(path)) => read_fixture(path)?.load(),
        (DataSourceKind::Sample, None) => FixtureSource::bundled().load(),
    };

    // Every API error becomes dashboard state; bad local input aborts outright.
    match result {
        Err(e) if ticket.source() == DataSourceKind::Sample => return Err(e.into()),
        result => {
            dashboard.finish_load(ticket, result);
        }
    }

    if let LoadState::Failed(message) = dashboard.load_state() {
        return Err(LiwanagCliError::FetchFailed(message.clone()));
    }
    Ok(dashboard)
}

fn load_config(data: &DataArgs) -> Result<DashboardConfig, LiwanagCliError> {
    Ok(match &data.config {
        Some(path) => DashboardConfig::load_from_file(path)?,
        None => DashboardConfig::load(),
    })
}

fn is_stdin(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_stdin() -> Result<String, LiwanagCliError> {
    if atty::is(atty::Stream::Stdin) {
        warn!("Reading JSON from an interactive terminal; end input with Ctrl-D");
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn read_fixture(path: &Path) -> Result<FixtureSource, LiwanagCliError> {
    if is_stdin(path) {
        Ok(FixtureSource::from_json("stdin", read_stdin()?))
    } else {
        Ok(FixtureSource::from_path(path)?)
    }
}

async fn cmd_devices(
    data: &DataArgs,
    format: OutputFormat,
    timeout: Option<i64>,
) -> Result<(), LiwanagCliError> {
    let mut config = load_config(data)?;
    if let Some(timeout) = timeout {
        config.device_timeout_minutes = timeout;
    }
    config.validate()?;

    let devices = if data.api {
        let url = data.url.clone().unwrap_or_else(|| config.devices_url.clone());
        debug!(url = %url, "Fetching device registry");
        let result = match RemoteSource::new(&url) {
            Ok(source) => source.fetch_devices().await,
            Err(e) => Err(e),
        };
        result.map_err(|e| LiwanagCliError::FetchFailed(e.to_string()))?
    } else {
        match &data.input {
            Some(path) if is_stdin(path) => parse_devices(&read_stdin()?)?,
            Some(path) => parse_devices(&fs::read_to_string(path)?)?,
            None => bundled_devices()?,
        }
    };

    let now = chrono::Utc::now().naive_utc();
    let summary = summarize_devices(&devices, now, config.device_timeout_minutes);
    match format {
        OutputFormat::Text => print!("{}", render_devices_text(&summary)),
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn cmd_classify(values: &[f64], json: bool) -> Result<(), LiwanagCliError> {
    let rows: Vec<ClassifiedLux> = values
        .iter()
        .map(|&lux| {
            let category = classify(lux);
            ClassifiedLux {
                lux,
                category: category.label().to_string(),
                severity: category.severity(),
                color: category.color().to_string(),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{:>8} lx  {:<15} {}", row.lux, row.category, row.color);
        }
    }
    Ok(())
}

fn cmd_doctor(input: Option<&Path>, json: bool) -> Result<(), LiwanagCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, LIWANAG_VERSION),
    });

    // Config
    let config_check = match std::env::var(CONFIG_ENV) {
        Ok(path) => match DashboardConfig::load_from_file(Path::new(&path)) {
            Ok(config) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "{} valid (threshold {} lx, {} steps)",
                    path, config.well_lit_threshold, config.interpolation_steps
                ),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        },
        Err(_) => {
            let config = DashboardConfig::load();
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "{} not set; effective threshold {} lx, api {}",
                    CONFIG_ENV, config.well_lit_threshold, config.api_url
                ),
            }
        }
    };
    checks.push(config_check);

    // Bundled sample
    checks.push(match FixtureSource::bundled().load() {
        Ok(payload) => DoctorCheck {
            name: "bundled_sample".to_string(),
            status: CheckStatus::Ok,
            message: format!("{} readings", payload.data.len()),
        },
        Err(e) => DoctorCheck {
            name: "bundled_sample".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    if let Some(path) = input {
        let check = if !path.exists() {
            DoctorCheck {
                name: "input".to_string(),
                status: CheckStatus::Warning,
                message: format!("{} does not exist", path.display()),
            }
        } else {
            match FixtureSource::from_path(path).and_then(|source| source.load()) {
                Ok(payload) => {
                    let uncategorized = payload
                        .data
                        .iter()
                        .filter(|r| r.area_key() == liwanag::types::UNCATEGORIZED_AREA)
                        .count();
                    DoctorCheck {
                        name: "input".to_string(),
                        status: if uncategorized > 0 {
                            CheckStatus::Warning
                        } else {
                            CheckStatus::Ok
                        },
                        message: format!(
                            "{} readings, {} without a barangay",
                            payload.data.len(),
                            uncategorized
                        ),
                    }
                }
                Err(e) => DoctorCheck {
                    name: "input".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            }
        };
        checks.push(check);
    }

    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: if atty::is(atty::Stream::Stdin) {
            "stdin is a TTY (use --input FILE)".to_string()
        } else {
            "stdin is a pipe (--input - ready)".to_string()
        },
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: LIWANAG_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("LIWANAG Doctor Report");
        println!("=====================");
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

    if report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error))
    {
        Err(LiwanagCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum LiwanagCliError {
    Io(io::Error),
    Liwanag(LiwanagError),
    Json(serde_json::Error),
    FetchFailed(String),
    DoctorFailed,
}

impl From<io::Error> for LiwanagCliError {
    fn from(e: io::Error) -> Self {
        LiwanagCliError::Io(e)
    }
}

impl From<LiwanagError> for LiwanagCliError {
    fn from(e: LiwanagError) -> Self {
        LiwanagCliError::Liwanag(e)
    }
}

impl From<serde_json::Error> for LiwanagCliError {
    fn from(e: serde_json::Error) -> Self {
        LiwanagCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LiwanagCliError> for CliError {
    fn from(e: LiwanagCliError) -> Self {
        match e {
            LiwanagCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LiwanagCliError::Liwanag(LiwanagError::UnknownArea(name)) => CliError {
                code: "UNKNOWN_AREA".to_string(),
                message: format!("No readings for barangay {name:?}"),
                hint: Some("Run 'liwanag analytics' to list barangays".to_string()),
            },
            LiwanagCliError::Liwanag(LiwanagError::Config(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'liwanag doctor' to check the configuration".to_string()),
            },
            LiwanagCliError::Liwanag(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input is a readings array or { data, count } object".to_string()),
            },
            LiwanagCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            LiwanagCliError::FetchFailed(msg) => CliError {
                code: "FETCH_FAILED".to_string(),
                message: msg,
                hint: Some("Retry the command, or drop --api to use the bundled sample".to_string()),
            },
            LiwanagCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ClassifiedLux {
    lux: f64,
    category: String,
    severity: u8,
    color: String,
}

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
