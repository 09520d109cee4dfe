//! Nudge CLI - Command-line interface for Tabnudge
//!
//! Commands:
//! - replay: Evaluate a recorded event log (batch mode)
//! - run: Evaluate events streamed on stdin (streaming mode)
//! - validate: Validate a trigger catalog file
//! - catalog: Print the built-in trigger catalog
//! - doctor: Diagnose engine health and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tabnudge::catalog::{Catalog, TriggerDefinition};
use tabnudge::config::EngineConfig;
use tabnudge::engine::Evaluator;
use tabnudge::events::TimedEvent;
use tabnudge::state::{JsonFileStore, StateStore};
use tabnudge::types::FiredTrigger;
use tabnudge::{CatalogError, EngineError, StoreError, ENGINE_VERSION, PRODUCER_NAME};
use tracing_subscriber::EnvFilter;

/// Nudge - Behavioral trigger engine for browser activity
#[derive(Parser)]
#[command(name = "nudge")]
#[command(author = "Tabnudge Contributors")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn browser activity events into celebration and nudge triggers", long_about = None)]
struct Cli {
    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a recorded event log (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Trigger catalog file (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Persistent trigger state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Discard the stored trigger state before evaluating
        #[arg(long, requires = "state")]
        reset_state: bool,
    },

    /// Evaluate events streamed on stdin (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Trigger catalog file (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Persistent trigger state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Discard the stored trigger state before evaluating
        #[arg(long, requires = "state")]
        reset_state: bool,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Validate a trigger catalog file
    Validate {
        /// Catalog file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in trigger catalog
    Catalog {
        /// Output the full definitions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Check a catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Check a persistent state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one fired trigger per line)
    Ndjson,
    /// JSON array of fired triggers
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "tabnudge=debug,nudge=debug" } else { "tabnudge=info,nudge=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), NudgeCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            catalog,
            config,
            state,
            reset_state,
        } => {
            let evaluator = build_evaluator(catalog.as_deref(), config.as_deref(), state.as_deref(), reset_state)?;
            cmd_replay(evaluator, &input, &output, input_format, output_format)
        }

        Commands::Run {
            output_format,
            catalog,
            config,
            state,
            reset_state,
            flush,
        } => {
            let evaluator = build_evaluator(catalog.as_deref(), config.as_deref(), state.as_deref(), reset_state)?;
            cmd_run(evaluator, output_format, flush)
        }

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Catalog { json } => cmd_catalog(json),

        Commands::Doctor { catalog, state, json } => cmd_doctor(catalog.as_deref(), state.as_deref(), json),
    }
}

fn cmd_replay(
    mut evaluator: Evaluator,
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), NudgeCliError> {
    let input_data = read_input(input)?;

    let events = match input_format {
        InputFormat::Ndjson => parse_ndjson(&input_data)?,
        InputFormat::Json => serde_json::from_str::<Vec<TimedEvent>>(&input_data)?,
    };

    if events.is_empty() {
        return Err(NudgeCliError::NoEvents);
    }

    let mut fired: Vec<FiredTrigger> = Vec::new();
    for event in &events {
        fired.extend(evaluate(&mut evaluator, event));
    }
    evaluator.stop();

    tracing::info!(events = events.len(), fired = fired.len(), "replay finished");

    let output_data = format_output(&fired, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(mut evaluator: Evaluator, output_format: OutputFormat, flush: bool) -> Result<(), NudgeCliError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let event = TimedEvent::from_json(trimmed)?;
        let fired = evaluate(&mut evaluator, &event);
        if fired.is_empty() {
            continue;
        }

        write!(stdout, "{}", format_output(&fired, &output_format)?)?;
        if matches!(output_format, OutputFormat::Json | OutputFormat::JsonPretty) {
            writeln!(stdout)?;
        }
        if flush {
            stdout.flush()?;
        }
    }

    evaluator.stop();
    stdout.flush()?;
    Ok(())
}

/// Start on the first event, then advance timers to each event's time before handling it
fn evaluate(evaluator: &mut Evaluator, event: &TimedEvent) -> Vec<FiredTrigger> {
    if !evaluator.is_running() {
        evaluator.start(event.timestamp);
    }
    let mut fired = evaluator.tick(event.timestamp);
    fired.extend(evaluator.handle(event));
    fired
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), NudgeCliError> {
    let input_data = read_input(input)?;
    let entries: Vec<serde_json::Value> = serde_json::from_str(&input_data)?;

    let mut errors: Vec<ValidationErrorDetail> = Vec::new();
    let mut parsed: Vec<(usize, TriggerDefinition)> = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<TriggerDefinition>(entry.clone()) {
            Ok(def) => parsed.push((index, def)),
            Err(e) => errors.push(ValidationErrorDetail {
                index,
                trigger_id: entry.get("id").and_then(|v| v.as_str()).map(str::to_string),
                error: e.to_string(),
            }),
        }
    }

    let definitions: Vec<TriggerDefinition> = parsed.iter().map(|(_, def)| def.clone()).collect();
    for (pos, err) in Catalog::validate_definitions(&definitions) {
        let (index, def) = &parsed[pos];
        errors.push(ValidationErrorDetail {
            index: *index,
            trigger_id: Some(def.id.as_str().to_string()),
            error: err.to_string(),
        });
    }
    errors.sort_by_key(|e| e.index);

    let mut invalid: Vec<usize> = errors.iter().map(|e| e.index).collect();
    invalid.dedup();

    let report = ValidationReport {
        total_triggers: entries.len(),
        valid_triggers: entries.len() - invalid.len(),
        invalid_triggers: invalid.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Catalog Validation Report");
        println!("=========================");
        println!("Total triggers:   {}", report.total_triggers);
        println!("Valid triggers:   {}", report.valid_triggers);
        println!("Invalid triggers: {}", report.invalid_triggers);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Trigger {} (index {}): {}",
                    err.trigger_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_triggers > 0 {
        Err(NudgeCliError::ValidationFailed(report.invalid_triggers))
    } else {
        Ok(())
    }
}

fn cmd_catalog(json: bool) -> Result<(), NudgeCliError> {
    let catalog = Catalog::builtin();

    if json {
        println!("{}", catalog.to_json_pretty()?);
        return Ok(());
    }

    println!("Built-in Trigger Catalog ({} triggers)", catalog.len());
    println!();
    for def in catalog.iter() {
        let scope = if def.domains.is_empty() {
            "any site".to_string()
        } else {
            format!("{} domains", def.domains.len())
        };
        println!("  {:<26} {:<10} {:<12} {}", def.id.as_str(), def.kind.as_str(), scope, def.name);
    }

    Ok(())
}

fn cmd_doctor(catalog: Option<&Path>, state: Option<&Path>, json: bool) -> Result<(), NudgeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Tabnudge version {}", ENGINE_VERSION),
    });

    // Check catalog
    let catalog_check = match catalog {
        None => DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Ok,
            message: format!("Built-in catalog ({} triggers)", Catalog::builtin().len()),
        },
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => match Catalog::from_json(&content) {
                Ok(loaded) => DoctorCheck {
                    name: "catalog".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Catalog file valid ({} triggers)", loaded.len()),
                },
                Err(e) => DoctorCheck {
                    name: "catalog".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid catalog: {}", e),
                },
            },
            Err(e) => DoctorCheck {
                name: "catalog".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read catalog file: {}", e),
            },
        },
    };
    checks.push(catalog_check);

    // Check state file if provided
    if let Some(state_path) = state {
        let state_check = if !state_path.exists() {
            DoctorCheck {
                name: "state".to_string(),
                status: CheckStatus::Warning,
                message: "State file does not exist (created on first run)".to_string(),
            }
        } else {
            match JsonFileStore::open(state_path).map(StateStore::new).and_then(|s| s.load()) {
                Ok(Some(record)) => DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "State file valid ({} triggers fired before, {} closed distractions)",
                        record.distraction_state.last_trigger_times.len(),
                        record.distraction_state.closed_distractions.len()
                    ),
                },
                Ok(None) => DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Warning,
                    message: "State file holds no trigger state yet".to_string(),
                },
                Err(e) => DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot load trigger state: {}", e),
                },
            }
        };
        checks.push(state_check);
    }

    // Check stdin is available (for streaming mode)
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
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Nudge Doctor Report");
        println!("===================");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(NudgeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, NudgeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_ndjson(data: &str) -> Result<Vec<TimedEvent>, NudgeCliError> {
    let mut events = Vec::new();
    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event = TimedEvent::from_json(trimmed)
            .map_err(|e| NudgeCliError::ParseError(format!("line {}: {}", line_no + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

fn build_evaluator(
    catalog: Option<&Path>,
    config: Option<&Path>,
    state: Option<&Path>,
    reset_state: bool,
) -> Result<Evaluator, NudgeCliError> {
    let catalog = match catalog {
        Some(path) => Catalog::from_json(&fs::read_to_string(path)?)?,
        None => Catalog::builtin(),
    };
    let config = match config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    let evaluator = Evaluator::new(catalog, config)?;
    let Some(path) = state else {
        return Ok(evaluator);
    };

    let mut store = StateStore::new(JsonFileStore::open(path)?);
    if reset_state {
        store.reset()?;
        tracing::info!(path = %path.display(), "trigger state reset");
    }
    Ok(evaluator.with_store(store))
}

fn format_output(fired: &[FiredTrigger], format: &OutputFormat) -> Result<String, NudgeCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for trigger in fired {
                lines.push(serde_json::to_string(trigger)?);
                lines.push("\n".to_string());
            }
            Ok(lines.concat())
        }
        OutputFormat::Json => Ok(serde_json::to_string(fired)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(fired)?),
    }
}

// Error types

#[derive(Debug)]
enum NudgeCliError {
    Io(io::Error),
    Engine(EngineError),
    Catalog(CatalogError),
    Store(StoreError),
    Json(serde_json::Error),
    NoEvents,
    ValidationFailed(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for NudgeCliError {
    fn from(e: io::Error) -> Self {
        NudgeCliError::Io(e)
    }
}

impl From<EngineError> for NudgeCliError {
    fn from(e: EngineError) -> Self {
        NudgeCliError::Engine(e)
    }
}

impl From<CatalogError> for NudgeCliError {
    fn from(e: CatalogError) -> Self {
        NudgeCliError::Catalog(e)
    }
}

impl From<StoreError> for NudgeCliError {
    fn from(e: StoreError) -> Self {
        NudgeCliError::Store(e)
    }
}

impl From<serde_json::Error> for NudgeCliError {
    fn from(e: serde_json::Error) -> Self {
        NudgeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<NudgeCliError> for CliError {
    fn from(e: NudgeCliError) -> Self {
        match e {
            NudgeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            NudgeCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the engine configuration and event input".to_string()),
            },
            NudgeCliError::Catalog(e) => CliError {
                code: "CATALOG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'nudge validate' on the catalog for details".to_string()),
            },
            NudgeCliError::Store(e) => CliError {
                code: "STATE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'nudge doctor --state <file>' to inspect the state file".to_string()),
            },
            NudgeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            NudgeCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            NudgeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} triggers failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            NudgeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            NudgeCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be one timestamped browser event".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_triggers: usize,
    valid_triggers: usize,
    invalid_triggers: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    trigger_id: Option<String>,
    error: String,
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
