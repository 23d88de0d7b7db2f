//! sqlbridge CLI - load the SQLite module into a fresh VM and drive it.
//!
//! Every command goes through the same globals and methods a script would
//! call, so thrown exceptions surface exactly as a script would see them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlbridge_sqlite::ModuleConfig;
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

mod commands;
mod session;

#[derive(Parser)]
#[command(
    name = "sqlbridge",
    version,
    about = "Drive the sqlbridge SQLite module from the command line",
    long_about = "Loads the SQLite module into a fresh VM and calls its bindings.\n\n\
                  Query a database:  sqlbridge query data.db 'SELECT * FROM t'\n\
                  Escape a literal:  sqlbridge escape \"O'Brien\""
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Module config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run SQL for its side effects
    Exec(commands::exec::ExecCommand),

    /// Run a query and print every row
    Query(commands::query::QueryCommand),

    /// Run a query and print the first row
    #[command(name = "query-one")]
    QueryOne(commands::query::QueryOneCommand),

    /// Escape text for a SQL literal
    Escape(commands::escape::EscapeCommand),

    /// List the open-mode flag constants
    Constants(commands::constants::ConstantsCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match cli.config.as_deref() {
        Some(path) => ModuleConfig::load(path)?,
        None => ModuleConfig::default(),
    };
    let session = session::Session::new(config)?;

    match cli.command {
        Commands::Exec(cmd) => cmd.run(&session),
        Commands::Query(cmd) => cmd.run(&session),
        Commands::QueryOne(cmd) => cmd.run(&session),
        Commands::Escape(cmd) => cmd.run(&session),
        Commands::Constants(cmd) => cmd.run(&session),
    }
}
