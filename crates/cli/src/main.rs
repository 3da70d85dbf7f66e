// StatGrid CLI - replay data grid edit scripts headlessly

mod exit_codes;
mod replay;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use statgrid_config::GridSettings;
use statgrid_engine::structure::{build_table_structure, build_variable_table};
use statgrid_engine::table::TableSettings;

use exit_codes::{
    EXIT_ERROR, EXIT_IO, EXIT_REPLAY_FAILED, EXIT_REPLAY_REJECTED, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "statgrid")]
#[command(about = "Data grid edit replay (headless)")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an edit script against empty or seeded stores
    #[command(after_help = "\
Examples:
  statgrid replay edits.json
  statgrid replay edits.json -f json -o result.json
  statgrid replay edits.json -f structure
  statgrid replay edits.json --strict --settings ./settings.json")]
    Replay {
        /// Script file (JSON)
        script: PathBuf,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Settings file (defaults to the user settings file)
        #[arg(long, env = "STATGRID_SETTINGS")]
        settings: Option<PathBuf>,

        /// Exit non-zero when a batch is rejected or an operation fails
        #[arg(long)]
        strict: bool,

        /// Suppress stderr notes
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Show or initialize settings
    Settings {
        /// Print the settings file path only
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Committed data with a header row of variable names
    Csv,
    /// Variables, rows and replay report
    Json,
    /// Data view table structure
    Structure,
    /// Variable view table
    Variables,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: statgrid <command> [options]");
            eprintln!("       statgrid --help for more information");
            Ok(())
        }
        Some(Commands::Replay { script, format, output, settings, strict, quiet }) => {
            cmd_replay(script, format, output, settings, strict, quiet)
        }
        Some(Commands::Settings { path }) => cmd_settings(path),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Map user settings onto what the engine consumes.
fn table_settings(settings: &GridSettings) -> TableSettings {
    TableSettings {
        min_rows: settings.min_rows,
        min_columns: settings.min_columns,
        default_column_width: settings.default_column_width,
        numeric_width: settings.numeric_width,
        numeric_decimals: settings.numeric_decimals,
        min_string_width: settings.min_string_width,
    }
}

// ============================================================================
// replay
// ============================================================================

fn cmd_replay(
    script: PathBuf,
    format: OutputFormat,
    output: Option<PathBuf>,
    settings_path: Option<PathBuf>,
    strict: bool,
    quiet: bool,
) -> Result<(), CliError> {
    if !script.exists() {
        return Err(CliError::usage(format!("script not found: {}", script.display())));
    }

    let grid_settings = match &settings_path {
        Some(path) if !path.exists() => {
            return Err(CliError::usage(format!("settings file not found: {}", path.display()))
                .with_hint("omit --settings to use the user settings file"))
        }
        Some(path) => GridSettings::load_from(path),
        None => GridSettings::load(),
    };
    let settings = table_settings(&grid_settings);

    let result = replay::execute_script(&script, settings)?;

    if !quiet {
        for rejected in &result.rejected {
            for cell in &rejected.cells {
                eprintln!(
                    "note: step {} rejected: cell ({}, {}): {}",
                    rejected.step, cell.row, cell.col, cell.reason
                );
            }
        }
        for failed in &result.failed {
            eprintln!("note: operation #{} ({}) failed: {}", failed.seq, failed.kind, failed.error);
        }
        eprintln!(
            "Replayed {} steps ({} operations applied, {} failed)",
            result.steps,
            result.applied,
            result.failed.len()
        );
    }

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path)
                .map_err(|e| CliError::io(format!("cannot create {}: {}", path.display(), e)))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        OutputFormat::Csv => replay::write_csv(&result.snapshot, &mut out)?,
        OutputFormat::Json => write_json(&mut out, &replay::to_json(&result))?,
        OutputFormat::Structure => {
            let structure = build_table_structure(&result.snapshot, &settings);
            write_json(&mut out, &structure)?
        }
        OutputFormat::Variables => {
            let table = build_variable_table(&result.snapshot.variables, &settings);
            write_json(&mut out, &table)?
        }
    }

    if strict && !result.rejected.is_empty() {
        return Err(CliError {
            code: EXIT_REPLAY_REJECTED,
            message: format!("{} edit batch(es) rejected", result.rejected.len()),
            hint: None,
        });
    }
    if strict && !result.failed.is_empty() {
        return Err(CliError {
            code: EXIT_REPLAY_FAILED,
            message: format!("{} operation(s) failed", result.failed.len()),
            hint: Some("failed operations are not rolled back; earlier steps stay applied".to_string()),
        });
    }

    Ok(())
}

fn write_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(|e| CliError::other(e.to_string()))?;
    writeln!(out).map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// settings
// ============================================================================

fn cmd_settings(path_only: bool) -> Result<(), CliError> {
    if path_only {
        println!("{}", GridSettings::config_path_display());
        return Ok(());
    }

    // Creates the default file on first use
    let settings = GridSettings::load();
    let json = serde_json::to_string_pretty(&settings).map_err(|e| CliError::other(e.to_string()))?;
    println!("{}", json);
    eprintln!("note: {}", GridSettings::config_path_display());
    Ok(())
}
