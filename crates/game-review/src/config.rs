//! Review configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chess_core::openings::OpeningBook;
use tracing::info;

use crate::error::ReviewError;

#[derive(Clone, Debug)]
pub struct ReviewConfig {
    /// Explicit Stockfish binary, tried before the usual install locations
    pub stockfish_path: Option<String>,

    /// Search depth per evaluated position
    pub depth: u32,

    /// Number of candidate lines requested per position
    pub multipv: u32,

    pub threads: u32,
    pub hash_mb: u32,

    /// Per-position timeout in seconds (0 disables it)
    pub eval_timeout_secs: u64,

    /// Replacement opening table (JSON)
    pub opening_book_path: Option<PathBuf>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            stockfish_path: None,
            depth: 16,
            multipv: 3,
            threads: 1,
            hash_mb: 256,
            eval_timeout_secs: 60,
            opening_book_path: None,
        }
    }
}

impl ReviewConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ReviewError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup (the process environment in `load`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReviewError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let stockfish_path = lookup("STOCKFISH_PATH").filter(|p| !p.trim().is_empty());
        let depth = parse_var(&lookup, "ANALYSIS_DEPTH", defaults.depth)?;
        let multipv = parse_var(&lookup, "ANALYSIS_MULTIPV", defaults.multipv)?;
        let threads = parse_var(&lookup, "STOCKFISH_THREADS", defaults.threads)?;
        let hash_mb = parse_var(&lookup, "STOCKFISH_HASH_MB", defaults.hash_mb)?;
        let eval_timeout_secs =
            parse_var(&lookup, "EVAL_TIMEOUT_SECS", defaults.eval_timeout_secs)?;
        let opening_book_path = lookup("OPENING_BOOK_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            stockfish_path,
            depth,
            multipv,
            threads,
            hash_mb,
            eval_timeout_secs,
            opening_book_path,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.depth == 0 {
            return Err(ReviewError::Config("ANALYSIS_DEPTH must be positive".into()));
        }
        if self.multipv == 0 {
            return Err(ReviewError::Config("ANALYSIS_MULTIPV must be at least 1".into()));
        }
        if self.threads == 0 {
            return Err(ReviewError::Config("STOCKFISH_THREADS must be at least 1".into()));
        }
        Ok(())
    }

    pub fn eval_timeout(&self) -> Option<Duration> {
        (self.eval_timeout_secs > 0).then(|| Duration::from_secs(self.eval_timeout_secs))
    }

    /// The configured opening table, or the built-in one.
    pub fn opening_book(&self) -> Result<OpeningBook, ReviewError> {
        match &self.opening_book_path {
            Some(path) => Ok(OpeningBook::load(path)?),
            None => {
                info!("Using built-in opening table");
                Ok(OpeningBook::default())
            }
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ReviewError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ReviewError::Config(format!("{key} has invalid value '{raw}'"))),
        None => Ok(default),
    }
}
