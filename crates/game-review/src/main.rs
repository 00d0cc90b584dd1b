//! Game review CLI
//!
//! Reads one PGN game, analyses it move by move and prints the report as JSON
//! on stdout. Logs go to stderr.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use game_review::analyzer::{AnalysisOptions, GameAnalyzer};
use game_review::config::ReviewConfig;
use game_review::engine::Engine;
use game_review::tutor;

#[derive(Parser, Debug)]
#[command(author, version, about = "Move-by-move review of a chess game", long_about = None)]
struct Args {
    /// PGN file to analyse, or '-' for stdin
    pgn: PathBuf,

    /// Search depth per position
    #[arg(long)]
    depth: Option<u32>,

    /// Candidate lines per position
    #[arg(long)]
    multipv: Option<u32>,

    /// Stockfish binary, tried before the usual install locations
    #[arg(long)]
    stockfish: Option<String>,

    /// Opening table (JSON) replacing the built-in one
    #[arg(long)]
    openings: Option<PathBuf>,

    /// Add a tutor explanation for every move
    #[arg(long)]
    tutor: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

fn read_pgn(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut pgn = String::new();
        std::io::stdin()
            .read_to_string(&mut pgn)
            .context("Failed to read PGN from stdin")?;
        return Ok(pgn);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = ReviewConfig::load()?;
    if let Some(depth) = args.depth {
        config.depth = depth;
    }
    if let Some(multipv) = args.multipv {
        config.multipv = multipv;
    }
    if let Some(path) = args.stockfish {
        config.stockfish_path = Some(path);
    }
    if let Some(path) = args.openings {
        config.opening_book_path = Some(path);
    }
    config.validate()?;

    let pgn = read_pgn(&args.pgn)?;
    let book = config.opening_book()?;

    info!(depth = config.depth, multipv = config.multipv, "Starting game review");
    let mut engine = Engine::discover(&config).await;

    let mut analyzer = GameAnalyzer::new(AnalysisOptions::from(&config)).with_book(&book);
    let report = analyzer.analyze_pgn(&mut engine, &pgn).await;
    engine.shutdown().await;

    let Some(report) = report else {
        error!("No analysis produced: the PGN could not be parsed");
        return Ok(ExitCode::FAILURE);
    };

    let mut json = serde_json::to_value(&report)?;
    if args.tutor {
        let notes: Vec<String> = report.moves.iter().map(tutor::explain).collect();
        json["tutor"] = serde_json::to_value(notes)?;
    }

    let out = if args.compact {
        serde_json::to_string(&json)?
    } else {
        serde_json::to_string_pretty(&json)?
    };
    println!("{out}");

    Ok(ExitCode::SUCCESS)
}
