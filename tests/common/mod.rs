#![allow(dead_code)]

use chess_core::game_data::fen_of;
use game_review::engine::{EvaluationResult, Evaluator};
use game_review::ReviewError;
use shakmaty::Chess;

/// Result with a White-relative score and optional best move.
pub fn eval(score: f64, best: Option<&str>) -> EvaluationResult {
    EvaluationResult {
        score,
        best_move: best.map(|m| m.to_string()),
        ..EvaluationResult::neutral()
    }
}

/// Replays canned results in call order and records what was asked.
///
/// The analyzer evaluates twice per ply, so call `2i` is the position before
/// ply `i` and call `2i + 1` the position after it. Calls past the end of the
/// script are neutral.
#[derive(Default)]
pub struct ScriptedEvaluator {
    script: Vec<EvaluationResult>,
    fail_on: Vec<usize>,
    /// (FEN, multipv) per call
    pub calls: Vec<(String, u32)>,
}

impl ScriptedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the before/after results for the next ply.
    pub fn ply(mut self, before: EvaluationResult, after: EvaluationResult) -> Self {
        self.script.push(before);
        self.script.push(after);
        self
    }

    /// Make the call at `index` fail.
    pub fn failing_on(mut self, index: usize) -> Self {
        self.fail_on.push(index);
        self
    }
}

impl Evaluator for ScriptedEvaluator {
    async fn evaluate(
        &mut self,
        position: &Chess,
        _depth: u32,
        multipv: u32,
    ) -> Result<EvaluationResult, ReviewError> {
        let index = self.calls.len();
        self.calls.push((fen_of(position), multipv));
        if self.fail_on.contains(&index) {
            return Err(ReviewError::Stockfish(format!("scripted failure at call {index}")));
        }
        Ok(self
            .script
            .get(index)
            .cloned()
            .unwrap_or_else(EvaluationResult::neutral))
    }
}
