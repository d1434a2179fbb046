use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use outbreak_cli::config::GameLogFile;
use outbreak_cli::logging::init_logging;
use outbreak_cli::report::{render_json, render_text};
use outbreak_core::model::game::InMemoryLog;
use outbreak_core::risk::compute_game_state;

/// Infection-deck tracker and risk estimator.
#[derive(Debug, Parser)]
#[command(
    name = "outbreak",
    author,
    version,
    about = "Reconstructs the infection deck from a game log and reports per-city risk"
)]
struct Cli {
    /// Path to the YAML game-log file.
    #[arg(value_name = "FILE")]
    log: PathBuf,

    /// Whether the current turn is still in its draw phase. Pass false
    /// once the player draws are resolved and only the infection step
    /// remains.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    draw_phase: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Exit after validating the log file (no report is computed).
    #[arg(long)]
    validate_only: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let resolved = GameLogFile::from_path(&cli.log)?.resolve()?;
    if cli.validate_only {
        println!(
            "{} ok: {} turns, {} cities",
            cli.log.display(),
            resolved.turns.len(),
            resolved.config.cities.len()
        );
        return Ok(());
    }

    let log = InMemoryLog::new(resolved.turns);
    let report = compute_game_state(&resolved.config, &resolved.meta, &log, cli.draw_phase)?;

    match cli.format {
        Format::Text => print!("{}", render_text(&report, &resolved.config)),
        Format::Json => println!("{}", render_json(&report)?),
    }

    Ok(())
}
