//! Tactical motif detection for a single move.
//!
//! Each detector is an independent predicate over a [`MoveContext`]; a move
//! carries every motif whose predicate holds.

pub mod attacks;
pub mod line_geometry;
pub mod simple;

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Color, Move, Piece, Position, Square};

use crate::board_utils::landing_square;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motif {
    Capture,
    WinningCapture,
    Check,
    Checkmate,
    Fork,
    DoubleAttack,
    Pin,
    Skewer,
    DiscoveredAttack,
    DiscoveredCheck,
    BackRank,
}

impl Motif {
    pub fn as_str(self) -> &'static str {
        match self {
            Motif::Capture => "capture",
            Motif::WinningCapture => "winning_capture",
            Motif::Check => "check",
            Motif::Checkmate => "checkmate",
            Motif::Fork => "fork",
            Motif::DoubleAttack => "double_attack",
            Motif::Pin => "pin",
            Motif::Skewer => "skewer",
            Motif::DiscoveredAttack => "discovered_attack",
            Motif::DiscoveredCheck => "discovered_check",
            Motif::BackRank => "back_rank",
        }
    }

    /// Human-readable name
    pub fn label(self) -> &'static str {
        match self {
            Motif::Capture => "Capture",
            Motif::WinningCapture => "Winning capture",
            Motif::Check => "Check",
            Motif::Checkmate => "Checkmate",
            Motif::Fork => "Fork",
            Motif::DoubleAttack => "Double attack",
            Motif::Pin => "Pin",
            Motif::Skewer => "Skewer",
            Motif::DiscoveredAttack => "Discovered attack",
            Motif::DiscoveredCheck => "Discovered check",
            Motif::BackRank => "Back-rank threat",
        }
    }
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a detector needs about one move.
pub struct MoveContext<'a> {
    pub before: &'a Chess,
    pub mv: &'a Move,
    pub after: &'a Chess,
    pub mover: Color,
    /// Where the moving piece stands afterwards (the king's square for castling)
    pub landing: Square,
}

impl<'a> MoveContext<'a> {
    pub fn new(before: &'a Chess, mv: &'a Move, after: &'a Chess) -> Self {
        Self {
            before,
            mv,
            after,
            mover: before.turn(),
            landing: landing_square(mv),
        }
    }

    pub fn enemy(&self) -> Color {
        !self.mover
    }

    /// The moved piece as it stands after the move (promotions included).
    pub fn moved_piece(&self) -> Option<Piece> {
        self.after.board().piece_at(self.landing)
    }
}

type Detector = fn(&MoveContext) -> bool;

const DETECTORS: &[(Motif, Detector)] = &[
    (Motif::Capture, simple::capture),
    (Motif::WinningCapture, simple::winning_capture),
    (Motif::Check, simple::check),
    (Motif::Checkmate, simple::checkmate),
    (Motif::Fork, attacks::fork),
    (Motif::DoubleAttack, attacks::double_attack),
    (Motif::Pin, line_geometry::pin),
    (Motif::Skewer, line_geometry::skewer),
    (Motif::DiscoveredAttack, attacks::discovered_attack),
    (Motif::DiscoveredCheck, attacks::discovered_check),
    (Motif::BackRank, simple::back_rank),
];

/// All motifs `mv` exhibits, in a fixed order.
pub fn detect(before: &Chess, mv: &Move, after: &Chess) -> Vec<Motif> {
    let ctx = MoveContext::new(before, mv, after);
    DETECTORS
        .iter()
        .filter(|(_, detector)| detector(&ctx))
        .map(|(motif, _)| *motif)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::motifs_for;
    use super::*;

    #[test]
    fn test_quiet_move_has_no_motifs() {
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert!(motifs_for(start, "e2e4").is_empty());
    }

    #[test]
    fn test_castling_has_no_motifs() {
        assert!(motifs_for("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1g1").is_empty());
    }

    #[test]
    fn test_knight_fork_with_check() {
        let motifs = motifs_for("r3k3/8/8/1N6/8/8/8/4K3 w - - 0 1", "b5c7");
        assert_eq!(motifs, vec![Motif::Check, Motif::Fork, Motif::DoubleAttack]);
    }

    #[test]
    fn test_back_rank_mate() {
        let motifs = motifs_for("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", "a1a8");
        assert_eq!(motifs, vec![Motif::Check, Motif::Checkmate, Motif::BackRank]);
    }

    #[test]
    fn test_motif_names() {
        assert_eq!(Motif::DiscoveredCheck.to_string(), "discovered_check");
        assert_eq!(
            serde_json::to_string(&Motif::BackRank).unwrap(),
            "\"back_rank\""
        );
        assert_eq!(Motif::DoubleAttack.label(), "Double attack");
    }
}
