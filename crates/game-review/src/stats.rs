//! Per-player aggregation over a finished list of move records.
//!
//! Everything here is a pure function of the records, so summaries can be
//! recomputed at any time and always agree.

use chess_core::game_data::Player;
use serde::{Deserialize, Serialize};

use crate::analysis::Category;
use crate::analyzer::MoveRecord;

/// Last ply number (1-based) that counts as opening.
pub const OPENING_LAST_PLY: usize = 12;
/// Last ply number (1-based) that counts as middlegame.
pub const MIDDLEGAME_LAST_PLY: usize = 40;

const BASE_RATING: f64 = 600.0;
const MIN_RATING: i64 = 400;
const MAX_RATING: i64 = 3200;
const QUALITY_BONUS_CAP: f64 = 300.0;

/// Count of moves per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveHistogram {
    pub brilliant: u32,
    pub great: u32,
    pub best: u32,
    pub excellent: u32,
    pub good: u32,
    pub theory: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
}

impl MoveHistogram {
    pub fn add(&mut self, category: Category) {
        *self.slot(category) += 1;
    }

    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::Brilliant => self.brilliant,
            Category::Great => self.great,
            Category::Best => self.best,
            Category::Excellent => self.excellent,
            Category::Good => self.good,
            Category::Theory => self.theory,
            Category::Inaccuracy => self.inaccuracy,
            Category::Mistake => self.mistake,
            Category::Blunder => self.blunder,
        }
    }

    fn slot(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::Brilliant => &mut self.brilliant,
            Category::Great => &mut self.great,
            Category::Best => &mut self.best,
            Category::Excellent => &mut self.excellent,
            Category::Good => &mut self.good,
            Category::Theory => &mut self.theory,
            Category::Inaccuracy => &mut self.inaccuracy,
            Category::Mistake => &mut self.mistake,
            Category::Blunder => &mut self.blunder,
        }
    }

    pub fn total(&self) -> u32 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }

    pub fn good_moves(&self) -> u32 {
        Category::ALL
            .iter()
            .filter(|c| c.is_good())
            .map(|c| self.get(*c))
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_moves: u32,
    #[serde(rename = "move_types")]
    pub histogram: MoveHistogram,
    /// Share of good moves, in percent
    pub accuracy: f64,
    pub average_centipawn_loss: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Opening,
    Middlegame,
    Endgame,
}

impl Phase {
    /// Phase of a 1-based ply number
    pub fn of_ply(ply: usize) -> Self {
        if ply <= OPENING_LAST_PLY {
            Phase::Opening
        } else if ply <= MIDDLEGAME_LAST_PLY {
            Phase::Middlegame
        } else {
            Phase::Endgame
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseLabel {
    Masterful,
    Excellent,
    Good,
    Average,
    #[serde(rename = "Needs Work")]
    NeedsWork,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl PhaseLabel {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 95.0 {
            PhaseLabel::Masterful
        } else if accuracy >= 85.0 {
            PhaseLabel::Excellent
        } else if accuracy >= 75.0 {
            PhaseLabel::Good
        } else if accuracy >= 60.0 {
            PhaseLabel::Average
        } else {
            PhaseLabel::NeedsWork
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRating {
    pub total_moves: u32,
    pub good_moves: u32,
    /// Percent; zero for an empty phase
    pub accuracy: f64,
    pub rating: PhaseLabel,
}

impl PhaseRating {
    fn empty() -> Self {
        Self {
            total_moves: 0,
            good_moves: 0,
            accuracy: 0.0,
            rating: PhaseLabel::NotApplicable,
        }
    }

    fn from_counts(total_moves: u32, good_moves: u32) -> Self {
        if total_moves == 0 {
            return Self::empty();
        }
        let accuracy = f64::from(good_moves) / f64::from(total_moves) * 100.0;
        Self {
            total_moves,
            good_moves,
            accuracy,
            rating: PhaseLabel::from_accuracy(accuracy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRatings {
    pub opening: PhaseRating,
    pub middlegame: PhaseRating,
    pub endgame: PhaseRating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub stats: PlayerStats,
    pub phases: PhaseRatings,
    /// `None` when the player made no moves
    pub estimated_rating: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub white: PlayerSummary,
    pub black: PlayerSummary,
    /// Both players together
    pub phases: PhaseRatings,
}

pub fn player_stats(records: &[MoveRecord], player: Player) -> PlayerStats {
    let mut histogram = MoveHistogram::default();
    let mut total_loss: i64 = 0;

    for record in records.iter().filter(|r| r.player == player) {
        histogram.add(record.classification.category);
        total_loss += i64::from(record.classification.centipawn_loss.max(0));
    }

    let total_moves = histogram.total();
    if total_moves == 0 {
        return PlayerStats::default();
    }

    PlayerStats {
        total_moves,
        accuracy: f64::from(histogram.good_moves()) / f64::from(total_moves) * 100.0,
        average_centipawn_loss: total_loss as f64 / f64::from(total_moves),
        histogram,
    }
}

/// Phase ratings over the given records
pub fn phase_ratings<'a, I>(records: I) -> PhaseRatings
where
    I: IntoIterator<Item = &'a MoveRecord>,
{
    // (total, good) per phase
    let mut counts = [(0u32, 0u32); 3];
    for record in records {
        let idx = match Phase::of_ply(record.ply) {
            Phase::Opening => 0,
            Phase::Middlegame => 1,
            Phase::Endgame => 2,
        };
        counts[idx].0 += 1;
        if record.classification.category.is_good() {
            counts[idx].1 += 1;
        }
    }

    PhaseRatings {
        opening: PhaseRating::from_counts(counts[0].0, counts[0].1),
        middlegame: PhaseRating::from_counts(counts[1].0, counts[1].1),
        endgame: PhaseRating::from_counts(counts[2].0, counts[2].1),
    }
}

fn accuracy_points(accuracy: f64) -> f64 {
    match accuracy {
        a if a >= 95.0 => 800.0,
        a if a >= 90.0 => 700.0,
        a if a >= 85.0 => 600.0,
        a if a >= 80.0 => 500.0,
        a if a >= 75.0 => 400.0,
        a if a >= 70.0 => 300.0,
        a => a / 70.0 * 300.0,
    }
}

fn acpl_points(acpl: f64) -> f64 {
    match acpl {
        a if a < 10.0 => 500.0,
        a if a < 20.0 => 450.0,
        a if a < 30.0 => 400.0,
        a if a < 50.0 => 350.0,
        a if a < 75.0 => 300.0,
        a if a < 100.0 => 250.0,
        a => (250.0 - (a - 100.0) * 2.0).max(0.0),
    }
}

/// Rough playing strength from one game's numbers, clamped to 400..=3200.
pub fn estimate_rating(stats: &PlayerStats, phases: &PhaseRatings) -> u32 {
    let h = &stats.histogram;

    let phase_points = (phases.opening.accuracy * 1.2
        + phases.middlegame.accuracy * 1.5
        + phases.endgame.accuracy * 1.3)
        / 4.0;
    let quality_bonus = (f64::from(h.brilliant) * 50.0
        + f64::from(h.great) * 30.0
        + f64::from(h.best) * 2.0)
        .min(QUALITY_BONUS_CAP);
    let penalty = f64::from(h.blunder) * 100.0 + f64::from(h.mistake) * 30.0;

    let estimated = BASE_RATING
        + accuracy_points(stats.accuracy)
        + acpl_points(stats.average_centipawn_loss)
        + phase_points
        + quality_bonus
        - penalty;

    (estimated as i64).clamp(MIN_RATING, MAX_RATING) as u32
}

pub fn player_summary(records: &[MoveRecord], player: Player) -> PlayerSummary {
    let stats = player_stats(records, player);
    let phases = phase_ratings(records.iter().filter(|r| r.player == player));
    let estimated_rating = (stats.total_moves > 0).then(|| estimate_rating(&stats, &phases));
    PlayerSummary {
        stats,
        phases,
        estimated_rating,
    }
}

pub fn summarize(records: &[MoveRecord]) -> GameSummary {
    GameSummary {
        white: player_summary(records, Player::White),
        black: player_summary(records, Player::Black),
        phases: phase_ratings(records),
    }
}
