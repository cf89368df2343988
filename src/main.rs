mod analysis;
mod bounds;
mod config;
mod counts;
mod manager;
mod stats;
mod table;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory holding the seed count files and receiving the outputs
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Default, Subcommand)]
enum Command {
    /// Aggregate the seed files and emit the bounds (default)
    #[default]
    Generate,

    /// Write the per-row means and standard deviations
    Aggregate,

    /// Emit the bounds from previously written means and standard deviations
    Emit,

    /// Verify every seed file against the emitted bounds
    Check,

    /// Remove all generated files
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(&args.work_dir, args.config.as_deref())
        .context("failed to construct mgr")?;

    match args.command.unwrap_or_default() {
        Command::Generate => mgr.generate()?,
        Command::Aggregate => mgr.aggregate()?,
        Command::Emit => mgr.emit()?,
        Command::Check => mgr.check()?,
        Command::Clean => mgr.clean()?,
    }

    Ok(())
}
