//! Core game analysis logic
//!
//! Replays a parsed game ply by ply. Each ply is evaluated before and after
//! the move, checked against the opening table, scanned for motifs and
//! classified; the records are then aggregated into a [`GameReport`].

use std::sync::atomic::{AtomicBool, Ordering};

use chess_core::game_data::{fen_of, san_with_suffix, to_uci, GameData, GameMetadata, Player};
use chess_core::openings::{OpeningBook, OpeningInfo, OpeningMatch};
use chess_core::pgn::parse_pgn;
use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Position};
use tracing::{debug, info, warn};

use crate::analysis::{classify_with, Classification, Thresholds};
use crate::config::ReviewConfig;
use crate::engine::{line_sans, CandidateMove, EvaluationResult, Evaluator, LIMITED_MODE_WARNING};
use crate::stats::{summarize, GameSummary};
use crate::tactics::{self, Motif};

/// One analysed ply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 1-based ply number
    pub ply: usize,
    /// Full-move number as written in the PGN
    pub move_number: u32,
    pub player: Player,
    pub san: String,
    #[serde(rename = "move")]
    pub uci: String,
    /// White-relative, pawns
    pub eval_before: f64,
    pub eval_after: f64,
    pub mate_before: Option<i32>,
    pub mate_after: Option<i32>,
    /// Engine's choice in the position before the move
    pub best_move: Option<String>,
    pub best_move_san: Option<String>,
    pub candidates: Vec<CandidateMove>,
    pub is_best: bool,
    pub is_book: bool,
    pub motifs: Vec<Motif>,
    pub classification: Classification,
    pub fen_after: String,
}

/// A move worth pointing out for its tactics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotifHighlight {
    pub ply: usize,
    pub san: String,
    #[serde(rename = "color")]
    pub player: Player,
    pub motifs: Vec<Motif>,
    pub fen: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReport {
    pub metadata: GameMetadata,
    pub opening: OpeningInfo,
    pub moves: Vec<MoveRecord>,
    pub motifs: Vec<MotifHighlight>,
    /// Score before the first move, then after every ply
    pub evaluation_trend: Vec<f64>,
    pub summary: GameSummary,
    pub engine_available: bool,
    pub warnings: Vec<String>,
    /// `false` when the analysis was cancelled part way
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub depth: u32,
    /// Candidate lines requested for the position before each move
    pub multipv: u32,
    pub thresholds: Thresholds,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            depth: 16,
            multipv: 3,
            thresholds: Thresholds::default(),
        }
    }
}

impl From<&ReviewConfig> for AnalysisOptions {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            depth: config.depth,
            multipv: config.multipv,
            thresholds: Thresholds::default(),
        }
    }
}

type ProgressFn<'a> = Box<dyn FnMut(f64) + Send + 'a>;

/// Drives a game through the evaluator, matcher, detector and classifier.
pub struct GameAnalyzer<'a> {
    options: AnalysisOptions,
    book: &'a OpeningBook,
    progress: Option<ProgressFn<'a>>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> GameAnalyzer<'a> {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            book: OpeningBook::builtin(),
            progress: None,
            cancel: None,
        }
    }

    pub fn with_book(mut self, book: &'a OpeningBook) -> Self {
        self.book = book;
        self
    }

    /// Called with the completed fraction after every ply.
    pub fn on_progress(mut self, callback: impl FnMut(f64) + Send + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Stop between plies once `flag` is set; the report keeps the finished prefix.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Parse and analyse a PGN. Unparsable input gives `None`.
    pub async fn analyze_pgn<E: Evaluator>(
        &mut self,
        engine: &mut E,
        pgn: &str,
    ) -> Option<GameReport> {
        match parse_pgn(pgn) {
            Ok(game) => Some(self.analyze(engine, &game).await),
            Err(e) => {
                warn!(error = %e, "PGN could not be parsed, no analysis produced");
                None
            }
        }
    }

    pub async fn analyze<E: Evaluator>(&mut self, engine: &mut E, game: &GameData) -> GameReport {
        let total = game.len();
        // The table is keyed from the initial position; set-up games have no theory.
        let opening = if game.starts_from_standard_position() {
            self.book.match_moves(&game.uci_moves())
        } else {
            OpeningMatch::unknown()
        };
        info!(
            plies = total,
            opening = %opening.info.name,
            white = %game.metadata.white,
            black = %game.metadata.black,
            "Starting analysis"
        );

        let engine_available = engine.is_available();
        let mut warnings = Vec::new();
        if !engine_available {
            warnings.push(LIMITED_MODE_WARNING.to_string());
        }

        let depth = self.options.depth;
        let multipv = self.options.multipv;
        let mut failures = 0usize;
        let mut moves: Vec<MoveRecord> = Vec::with_capacity(total);
        let mut trend: Vec<f64> = Vec::with_capacity(total + 1);
        let mut complete = true;

        let mut pos: Chess = game.start.clone();
        for (i, mv) in game.moves.iter().enumerate() {
            if self.cancelled() {
                info!(ply = i + 1, "Analysis cancelled");
                complete = false;
                break;
            }

            let before = pos.clone();
            let eval_before =
                evaluate_or_neutral(engine, &before, depth, multipv, i + 1, &mut failures).await;
            if i == 0 {
                trend.push(eval_before.score);
            }

            let mut after = before.clone();
            after.play_unchecked(mv.clone());
            let eval_after =
                evaluate_or_neutral(engine, &after, depth, 1, i + 1, &mut failures).await;

            let player = Player::from(before.turn());
            let uci = to_uci(mv);
            let san = san_with_suffix(&before, mv, &after);
            let is_best = eval_before.best_move.as_deref() == Some(uci.as_str());
            let is_book = opening.is_book_ply(i);
            let motifs = tactics::detect(&before, mv, &after);
            let classification = classify_with(
                &self.options.thresholds,
                eval_before.score,
                eval_after.score,
                player,
                is_best,
                is_book,
            );

            debug!(
                ply = i + 1,
                san = %san,
                eval_before = eval_before.score,
                eval_after = eval_after.score,
                category = %classification.category,
                "Classified move"
            );

            trend.push(eval_after.score);
            moves.push(MoveRecord {
                ply: i + 1,
                move_number: before.fullmoves().get(),
                player,
                san,
                uci,
                eval_before: eval_before.score,
                eval_after: eval_after.score,
                mate_before: eval_before.mate_in,
                mate_after: eval_after.mate_in,
                best_move_san: best_move_san(&before, &eval_before),
                best_move: eval_before.best_move,
                candidates: eval_before.candidates,
                is_best,
                is_book,
                motifs,
                classification,
                fen_after: fen_of(&after),
            });

            if let Some(progress) = self.progress.as_mut() {
                progress((i + 1) as f64 / total as f64);
            }
            pos = after;
        }

        if failures > 0 {
            warnings.push(format!(
                "{failures} position evaluations failed and were scored as neutral"
            ));
        }

        let motifs = highlights(&moves);
        let summary = summarize(&moves);
        info!(
            plies = moves.len(),
            complete,
            white_accuracy = summary.white.stats.accuracy,
            black_accuracy = summary.black.stats.accuracy,
            "Analysis finished"
        );

        GameReport {
            metadata: game.metadata.clone(),
            opening: opening.info,
            moves,
            motifs,
            evaluation_trend: trend,
            summary,
            engine_available,
            warnings,
            complete,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Analyse with an engine shared between callers; the lock is held for the whole game.
pub async fn analyze_shared<E: Evaluator>(
    engine: &tokio::sync::Mutex<E>,
    analyzer: &mut GameAnalyzer<'_>,
    pgn: &str,
) -> Option<GameReport> {
    let mut guard = engine.lock().await;
    analyzer.analyze_pgn(&mut *guard, pgn).await
}

async fn evaluate_or_neutral<E: Evaluator>(
    engine: &mut E,
    position: &Chess,
    depth: u32,
    multipv: u32,
    ply: usize,
    failures: &mut usize,
) -> EvaluationResult {
    match engine.evaluate(position, depth, multipv).await {
        Ok(result) => result,
        Err(e) => {
            warn!(ply, error = %e, "Evaluation failed, using neutral score");
            *failures += 1;
            EvaluationResult::neutral()
        }
    }
}

fn best_move_san(before: &Chess, eval: &EvaluationResult) -> Option<String> {
    let best = eval.best_move.as_ref()?;
    if let Some(top) = eval.candidates.iter().find(|c| &c.uci == best) {
        if top.san.is_some() {
            return top.san.clone();
        }
    }
    line_sans(before, std::slice::from_ref(best), 1).into_iter().next()
}

fn highlights(moves: &[MoveRecord]) -> Vec<MotifHighlight> {
    moves
        .iter()
        .filter(|m| !m.motifs.is_empty())
        .map(|m| MotifHighlight {
            ply: m.ply,
            san: m.san.clone(),
            player: m.player,
            motifs: m.motifs.clone(),
            fen: m.fen_after.clone(),
        })
        .collect()
}
