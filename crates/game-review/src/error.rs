//! Review error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Stockfish closed its output")]
    EngineClosed,

    #[error("Stockfish did not answer within {0}s")]
    Timeout(u64),

    #[error("Opening table error: {0}")]
    Opening(#[from] chess_core::openings::OpeningError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
