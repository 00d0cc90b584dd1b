//! Position evaluation.
//!
//! Every [`EvaluationResult`] is White-relative and in pawns, whoever is to
//! move. UCI engines report scores for the side to move, so [`Engine`] flips
//! them for Black before anything else sees them. The classifier relies on
//! this single convention.

use chess_core::game_data::{fen_of, san_with_suffix};
use serde::{Deserialize, Serialize};
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, Position};
use tracing::{info, warn};

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::stockfish::{EngineOptions, PvLine, SearchOutput, StockfishEngine};

/// Centipawn value of a mate on the board; mate in N scores `MATE_SCORE_CP - 10 * N`.
pub const MATE_SCORE_CP: i32 = 10_000;

/// Candidate lines show this many moves after the candidate itself.
pub const MAX_CONTINUATION: usize = 5;

/// Install locations tried after the configured path.
pub const CANDIDATE_PATHS: &[&str] = &[
    "/usr/games/stockfish",
    "/usr/local/bin/stockfish",
    "stockfish",
    "/opt/homebrew/bin/stockfish",
];

pub const LIMITED_MODE_WARNING: &str =
    "Stockfish not found; running in limited mode with neutral evaluations";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMove {
    #[serde(rename = "move")]
    pub uci: String,
    pub san: Option<String>,
    /// Pawns, White-relative
    pub score: f64,
    pub mate_in: Option<i32>,
    /// SAN moves following the candidate
    pub continuation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Pawns, positive favours White
    pub score: f64,
    /// Engine's preferred move in UCI notation
    pub best_move: Option<String>,
    /// Positive when White mates, negative when Black does.
    /// Zero means the side to move is already checkmated.
    pub mate_in: Option<i32>,
    /// Ranked best first
    pub candidates: Vec<CandidateMove>,
}

impl EvaluationResult {
    /// Placeholder used in limited mode and when a single evaluation fails.
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            best_move: None,
            mate_in: None,
            candidates: Vec::new(),
        }
    }
}

/// Anything that can score a position.
///
/// `&mut self` keeps one request in flight per evaluator, which is what a UCI
/// process needs.
#[allow(async_fn_in_trait)]
pub trait Evaluator {
    async fn evaluate(
        &mut self,
        position: &Chess,
        depth: u32,
        multipv: u32,
    ) -> Result<EvaluationResult, ReviewError>;

    /// `false` when every result is a neutral placeholder.
    fn is_available(&self) -> bool {
        true
    }
}

/// Convert a side-to-move engine score to White-relative centipawns
pub fn white_relative_cp(cp: Option<i32>, mate: Option<i32>, white_to_move: bool) -> i32 {
    let stm = match (mate, cp) {
        (Some(m), _) if m > 0 => MATE_SCORE_CP - m * 10,
        (Some(m), _) => -MATE_SCORE_CP - m * 10,
        (None, Some(c)) => c,
        (None, None) => 0,
    };
    if white_to_move {
        stm
    } else {
        -stm
    }
}

/// The long-lived engine handle owned by whoever composes the pipeline.
pub enum Engine {
    Stockfish(StockfishEngine),
    /// No usable binary; every evaluation is neutral
    Unavailable,
}

impl Engine {
    /// Try the configured path, then the usual install locations.
    /// Never fails: without a working binary the handle is `Unavailable`.
    pub async fn discover(config: &ReviewConfig) -> Self {
        let options = EngineOptions {
            threads: config.threads,
            hash_mb: config.hash_mb,
            search_timeout: config.eval_timeout(),
        };

        let configured = config.stockfish_path.as_deref().into_iter();
        for path in configured.chain(CANDIDATE_PATHS.iter().copied()) {
            match StockfishEngine::new(path, &options).await {
                Ok(engine) => {
                    info!(path, "Stockfish ready");
                    return Engine::Stockfish(engine);
                }
                Err(e) => tracing::debug!(path, error = %e, "Stockfish candidate rejected"),
            }
        }

        warn!("{}", LIMITED_MODE_WARNING);
        Engine::Unavailable
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Engine::Stockfish(sf) => Some(sf.path()),
            Engine::Unavailable => None,
        }
    }

    /// Quit the engine process and wait for it to exit.
    pub async fn shutdown(self) {
        if let Engine::Stockfish(mut sf) = self {
            sf.quit().await;
            info!("Stockfish shut down");
        }
    }
}

impl Evaluator for Engine {
    async fn evaluate(
        &mut self,
        position: &Chess,
        depth: u32,
        multipv: u32,
    ) -> Result<EvaluationResult, ReviewError> {
        let sf = match self {
            Engine::Stockfish(sf) => sf,
            Engine::Unavailable => return Ok(EvaluationResult::neutral()),
        };

        if position.is_checkmate() {
            return Ok(checkmated(position.turn()));
        }
        if position.is_stalemate() {
            return Ok(EvaluationResult::neutral());
        }

        let output = sf.search(&fen_of(position), depth, multipv).await?;
        Ok(from_search(position, output))
    }

    fn is_available(&self) -> bool {
        matches!(self, Engine::Stockfish(_))
    }
}

fn checkmated(loser: Color) -> EvaluationResult {
    let cp = white_relative_cp(None, Some(0), loser == Color::White);
    EvaluationResult {
        score: f64::from(cp) / 100.0,
        best_move: None,
        mate_in: Some(0),
        candidates: Vec::new(),
    }
}

/// Turn raw search output into a White-relative result for `position`.
pub fn from_search(position: &Chess, output: SearchOutput) -> EvaluationResult {
    let white_to_move = position.turn() == Color::White;

    let candidates: Vec<CandidateMove> = output
        .lines
        .iter()
        .filter_map(|line| candidate(position, line, white_to_move))
        .collect();

    let top = output.lines.first();
    let score = top
        .map(|l| f64::from(white_relative_cp(l.cp, l.mate, white_to_move)) / 100.0)
        .unwrap_or(0.0);
    let mate_in = top
        .and_then(|l| l.mate)
        .map(|m| if white_to_move { m } else { -m });
    let best_move = output
        .best_move
        .or_else(|| candidates.first().map(|c| c.uci.clone()));

    EvaluationResult {
        score,
        best_move,
        mate_in,
        candidates,
    }
}

fn candidate(position: &Chess, line: &PvLine, white_to_move: bool) -> Option<CandidateMove> {
    let uci = line.pv.first()?.clone();
    let mut sans = line_sans(position, &line.pv, MAX_CONTINUATION + 1);
    let san = (!sans.is_empty()).then(|| sans.remove(0));

    Some(CandidateMove {
        uci,
        san,
        score: f64::from(white_relative_cp(line.cp, line.mate, white_to_move)) / 100.0,
        mate_in: line.mate.map(|m| if white_to_move { m } else { -m }),
        continuation: sans,
    })
}

/// SAN for the leading legal prefix of a UCI line
pub fn line_sans(position: &Chess, pv: &[String], limit: usize) -> Vec<String> {
    let mut pos = position.clone();
    let mut sans = Vec::new();
    for token in pv.iter().take(limit) {
        let Ok(uci) = token.parse::<UciMove>() else {
            break;
        };
        let Ok(mv) = uci.to_move(&pos) else {
            break;
        };
        let mut after = pos.clone();
        after.play_unchecked(mv.clone());
        sans.push(san_with_suffix(&pos, &mv, &after));
        pos = after;
    }
    sans
}
