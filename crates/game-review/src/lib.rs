//! Move-by-move game review.
//!
//! A parsed game is replayed against an [`engine::Evaluator`]; every ply is
//! classified, scanned for tactical motifs and checked against the opening
//! table, and the resulting records are aggregated into per-player statistics.

pub mod analysis;
pub mod analyzer;
pub mod board_utils;
pub mod config;
pub mod engine;
pub mod error;
pub mod stats;
pub mod stockfish;
pub mod tactics;
pub mod tutor;

pub use analyzer::{analyze_shared, GameAnalyzer, GameReport, MoveRecord};
pub use engine::{Engine, EvaluationResult, Evaluator};
pub use error::ReviewError;
