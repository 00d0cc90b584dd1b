//! Move classification: pure functions only
//! (No Board/Engine/Game dependencies)
//!
//! Evaluations arrive White-relative in pawns. They are turned to the mover's
//! side, the centipawn delta is taken, and an ordered rule table picks the
//! first matching category.

use std::fmt;

use chess_core::game_data::Player;
use serde::{Deserialize, Serialize};

/// Move quality grades, from best to worst for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Theory,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Brilliant,
        Category::Great,
        Category::Best,
        Category::Excellent,
        Category::Good,
        Category::Theory,
        Category::Inaccuracy,
        Category::Mistake,
        Category::Blunder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Brilliant => "brilliant",
            Category::Great => "great",
            Category::Best => "best",
            Category::Excellent => "excellent",
            Category::Good => "good",
            Category::Theory => "theory",
            Category::Inaccuracy => "inaccuracy",
            Category::Mistake => "mistake",
            Category::Blunder => "blunder",
        }
    }

    /// Counts towards accuracy.
    pub fn is_good(self) -> bool {
        !matches!(
            self,
            Category::Inaccuracy | Category::Mistake | Category::Blunder
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Category::Brilliant => "!!",
            Category::Great => "!",
            Category::Best => "★",
            Category::Excellent => "⁺",
            Category::Good => "",
            Category::Theory => "⚐",
            Category::Inaccuracy => "?!",
            Category::Mistake => "?",
            Category::Blunder => "??",
        }
    }

    pub fn feedback(self) -> &'static str {
        match self {
            Category::Brilliant => "Brilliant!!",
            Category::Great => "Great move!",
            Category::Best => "Best",
            Category::Excellent => "Excellent",
            Category::Good => "Good",
            Category::Theory => "Theory",
            Category::Inaccuracy => "Inaccuracy",
            Category::Mistake => "Mistake",
            Category::Blunder => "Blunder!!",
        }
    }

    pub fn explanation(self) -> &'static str {
        match self {
            Category::Brilliant => {
                "An unexpected move that is objectively sound and improves the position."
            }
            Category::Great => "A very strong alternative to the engine's choice.",
            Category::Best => "The optimal move, or indistinguishable from it.",
            Category::Excellent => "A strong move that gives away almost nothing.",
            Category::Good => "A reasonable move that keeps the position together.",
            Category::Theory => "A known opening move.",
            Category::Inaccuracy => "Playable, but better options were available.",
            Category::Mistake => "A clear error that weakens the position.",
            Category::Blunder => "A serious error that gives away material or the game.",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification thresholds (centipawns)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub brilliant_max_loss: i32,
    pub brilliant_min_gain: i32,
    pub great_max_loss: i32,
    pub best_max_loss: i32,
    pub excellent: i32,
    pub good: i32,
    pub inaccuracy: i32,
    pub mistake: i32,
    /// Deltas smaller than this are treated as zero
    pub noise_floor: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            brilliant_max_loss: 15,
            brilliant_min_gain: 20,
            great_max_loss: 15,
            best_max_loss: 10,
            excellent: 25,
            good: 50,
            inaccuracy: 100,
            mistake: 200,
            noise_floor: 1.0,
        }
    }
}

/// The facts a rule looks at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judgement {
    /// Centipawns given away by the move, never negative
    pub loss: i32,
    /// Centipawns the mover's evaluation improved by, never negative
    pub gain: i32,
    pub is_best: bool,
    pub is_book: bool,
}

struct Rule {
    category: Category,
    applies: fn(&Thresholds, &Judgement) -> bool,
}

/// Evaluated top to bottom; the first rule that applies wins.
const RULES: &[Rule] = &[
    Rule {
        category: Category::Theory,
        applies: |_, j| j.is_book,
    },
    Rule {
        category: Category::Brilliant,
        applies: |t, j| {
            !j.is_best && j.loss <= t.brilliant_max_loss && j.gain >= t.brilliant_min_gain
        },
    },
    Rule {
        category: Category::Great,
        applies: |t, j| !j.is_best && j.loss <= t.great_max_loss,
    },
    Rule {
        category: Category::Best,
        applies: |t, j| j.is_best || j.loss < t.best_max_loss,
    },
    Rule {
        category: Category::Excellent,
        applies: |t, j| j.loss < t.excellent,
    },
    Rule {
        category: Category::Good,
        applies: |t, j| j.loss < t.good,
    },
    Rule {
        category: Category::Inaccuracy,
        applies: |t, j| j.loss < t.inaccuracy,
    },
    Rule {
        category: Category::Mistake,
        applies: |t, j| j.loss < t.mistake,
    },
    Rule {
        category: Category::Blunder,
        applies: |_, _| true,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub centipawn_loss: i32,
    pub symbol: String,
    pub feedback: String,
    pub explanation: String,
    /// Short practical advice
    pub teaching: String,
}

/// Signed centipawn change from the mover's point of view; positive means the
/// mover's position got worse.
pub fn centipawn_delta(eval_before: f64, eval_after: f64, mover: Player, noise_floor: f64) -> i32 {
    let (before, after) = match mover {
        Player::White => (eval_before, eval_after),
        Player::Black => (-eval_before, -eval_after),
    };
    let raw = (before - after) * 100.0;
    if raw.abs() < noise_floor {
        0
    } else {
        raw.round() as i32
    }
}

/// Centipawns lost by the mover, never negative.
pub fn centipawn_loss(eval_before: f64, eval_after: f64, mover: Player) -> i32 {
    centipawn_delta(eval_before, eval_after, mover, Thresholds::default().noise_floor).max(0)
}

pub fn judge(
    thresholds: &Thresholds,
    eval_before: f64,
    eval_after: f64,
    mover: Player,
    is_best: bool,
    is_book: bool,
) -> Judgement {
    let delta = centipawn_delta(eval_before, eval_after, mover, thresholds.noise_floor);
    Judgement {
        loss: delta.max(0),
        gain: (-delta).max(0),
        is_best,
        is_book,
    }
}

/// Pick the category for a judged move.
pub fn categorize(thresholds: &Thresholds, judgement: &Judgement) -> Category {
    RULES
        .iter()
        .find(|rule| (rule.applies)(thresholds, judgement))
        .map(|rule| rule.category)
        .unwrap_or(Category::Blunder)
}

/// Classify a move with the default thresholds.
pub fn classify(
    eval_before: f64,
    eval_after: f64,
    mover: Player,
    is_best: bool,
    is_book: bool,
) -> Classification {
    classify_with(
        &Thresholds::default(),
        eval_before,
        eval_after,
        mover,
        is_best,
        is_book,
    )
}

pub fn classify_with(
    thresholds: &Thresholds,
    eval_before: f64,
    eval_after: f64,
    mover: Player,
    is_best: bool,
    is_book: bool,
) -> Classification {
    let judgement = judge(thresholds, eval_before, eval_after, mover, is_best, is_book);
    let category = categorize(thresholds, &judgement);
    let centipawn_loss = if category == Category::Theory {
        0
    } else {
        judgement.loss
    };

    Classification {
        category,
        centipawn_loss,
        symbol: category.symbol().to_string(),
        feedback: category.feedback().to_string(),
        explanation: category.explanation().to_string(),
        teaching: teaching(category, centipawn_loss),
    }
}

fn teaching(category: Category, loss: i32) -> String {
    match category {
        Category::Brilliant => "A rare find. Study this position.".to_string(),
        Category::Great => "Almost as good as the engine's choice.".to_string(),
        Category::Best => "This is what the engine recommends.".to_string(),
        Category::Excellent => format!("Only {loss} centipawns from perfect."),
        Category::Good => format!("Solid. {loss} centipawns is acceptable in practical play."),
        Category::Theory => "Following book moves is good in the opening.".to_string(),
        Category::Inaccuracy => {
            format!("Lost {loss} centipawns. Look for more active piece placement.")
        }
        Category::Mistake => format!(
            "Lost {loss} centipawns. Check piece safety and the opponent's threats before moving."
        ),
        Category::Blunder => format!(
            "Lost {loss} centipawns. Blunder-check every move: checks, captures, attacks, undefended pieces."
        ),
    }
}
