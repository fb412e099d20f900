//! Command-line lookup over a core database.
//!
//! # Responsibility
//! - Open a session, run one coordinate-system query, print JSON.
//! - Report lookup warnings on stderr, and in the log directory when given.
//! - Keep all lookup semantics inside `coordsys_core`.

use clap::{Parser, Subcommand};
use coordsys_core::db::open_db;
use coordsys_core::{
    default_log_level, flush_logging, init_logging, init_stderr_logging, CoordSystemService,
    SpeciesId, SqliteCoordSystemRepository, DEFAULT_SPECIES_ID,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Level of the stderr-only logger used when no log directory is given.
const STDERR_LOG_LEVEL: &str = "warn";

#[derive(Debug, Parser)]
#[command(name = "coordsys", version, about = "Query coordinate systems of a core database")]
struct Cli {
    /// SQLite core database to read.
    #[arg(long)]
    db: PathBuf,

    #[arg(long, default_value_t = DEFAULT_SPECIES_ID)]
    species: SpeciesId,

    /// Absolute directory for rotating log files. Without it only warnings
    /// and errors are logged, to stderr.
    #[arg(long)]
    log_dir: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// All coordinate systems of the species in rank order.
    List,
    /// One coordinate system by name or alias (`toplevel`, `seqlevel`).
    Get {
        name: String,
        #[arg(long)]
        version: Option<String>,
    },
    /// One coordinate system by rank; 0 is the top level.
    Rank { rank: i64 },
    /// One coordinate system by id.
    Id { coord_system_id: i64 },
    /// Default assembly version of the species.
    DefaultVersion,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = run(&cli);
    flush_logging();

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command; returns false when the lookup found nothing.
fn run(cli: &Cli) -> Result<bool, Box<dyn Error>> {
    match cli.log_dir.as_deref() {
        Some(log_dir) => {
            let level = cli.log_level.as_deref().unwrap_or(default_log_level());
            init_logging(level, log_dir)?;
        }
        None => init_stderr_logging(cli.log_level.as_deref().unwrap_or(STDERR_LOG_LEVEL))?,
    }

    let conn = open_db(&cli.db)?;
    let mut service = CoordSystemService::new(SqliteCoordSystemRepository::try_new(&conn)?);
    info!(
        "event=cli_command module=cli status=start species_id={} command={:?}",
        cli.species, cli.command
    );

    let found = match &cli.command {
        Command::List => print_json(&service.get_all(cli.species)?)?,
        Command::Get { name, version } => {
            // Aliases resolve against a scan, so make sure one exists.
            service.get_all(cli.species)?;
            print_json(&service.get_by_name(name, version.as_deref(), cli.species)?)?
        }
        Command::Rank { rank } => print_json(&service.get_by_rank(*rank, cli.species)?)?,
        Command::Id { coord_system_id } => print_json(&service.get_by_id(*coord_system_id)?)?,
        Command::DefaultVersion => print_json(&service.default_version(cli.species)?)?,
    };
    Ok(found)
}

/// Prints `value` as pretty JSON; returns false when it serialized to `null`.
fn print_json<T: Serialize>(value: &T) -> Result<bool, serde_json::Error> {
    let json = serde_json::to_value(value)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(!json.is_null())
}
