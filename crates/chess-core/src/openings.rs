//! Opening identification by longest move-prefix match.
//!
//! The table is a list of UCI move sequences with a name, ECO range, key ideas
//! and a rating. A game is matched once against its first [`EARLY_GAME_WINDOW`]
//! plies; the longest table line that is a prefix of the game wins, ties going
//! to the earlier entry. Plies inside the matched line are book moves.

use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Only the first plies of a game are considered when matching an opening.
pub const EARLY_GAME_WINDOW: usize = 10;

const UNKNOWN_NAME: &str = "Unknown Opening";
const UNKNOWN_ECO: &str = "A00";
const UNKNOWN_RATING: f64 = 5.0;

static DEFAULT_BOOK: LazyLock<OpeningBook> = LazyLock::new(|| {
    OpeningBook::from_json(include_str!("../data/openings.json")).unwrap_or_else(|e| {
        tracing::warn!("Built-in opening table failed to load: {}", e);
        OpeningBook::new(Vec::new())
    })
});

#[derive(Debug, Error)]
pub enum OpeningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Opening table is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Opening '{0}' has no moves")]
    EmptyLine(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningInfo {
    pub name: String,
    pub eco: String,
    pub key_ideas: Vec<String>,
    pub rating: f64,
}

impl OpeningInfo {
    /// Sentinel returned when no table line matches.
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_NAME.to_string(),
            eco: UNKNOWN_ECO.to_string(),
            key_ideas: Vec::new(),
            rating: UNKNOWN_RATING,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_NAME
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningEntry {
    /// UCI moves from the standard starting position.
    pub moves: Vec<String>,
    #[serde(flatten)]
    pub info: OpeningInfo,
}

/// Result of matching a game's move prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningMatch {
    pub info: OpeningInfo,
    /// Length of the matched table line; zero when nothing matched.
    pub matched_plies: usize,
}

impl OpeningMatch {
    pub fn unknown() -> Self {
        Self {
            info: OpeningInfo::unknown(),
            matched_plies: 0,
        }
    }

    /// Whether the ply at `index` (0-based) lies inside the matched line.
    pub fn is_book_ply(&self, index: usize) -> bool {
        index < self.matched_plies
    }
}

#[derive(Debug, Clone)]
pub struct OpeningBook {
    entries: Vec<OpeningEntry>,
    window: usize,
}

impl Default for OpeningBook {
    fn default() -> Self {
        DEFAULT_BOOK.clone()
    }
}

impl OpeningBook {
    /// The embedded table, parsed on first use.
    pub fn builtin() -> &'static OpeningBook {
        &DEFAULT_BOOK
    }

    pub fn new(entries: Vec<OpeningEntry>) -> Self {
        Self {
            entries,
            window: EARLY_GAME_WINDOW,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, OpeningError> {
        let entries: Vec<OpeningEntry> = serde_json::from_str(json)?;
        if let Some(empty) = entries.iter().find(|e| e.moves.is_empty()) {
            return Err(OpeningError::EmptyLine(empty.info.name.clone()));
        }
        Ok(Self::new(entries))
    }

    /// Load a replacement table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OpeningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let book = Self::from_json(&json)?;
        tracing::info!(
            "Loaded {} openings from {}",
            book.len(),
            path.as_ref().display()
        );
        Ok(book)
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Match a game's UCI moves against the table.
    pub fn match_moves<S: AsRef<str>>(&self, moves: &[S]) -> OpeningMatch {
        let early = &moves[..moves.len().min(self.window)];

        let mut best: Option<&OpeningEntry> = None;
        for entry in &self.entries {
            let line = &entry.moves;
            if line.len() > early.len() {
                continue;
            }
            let is_prefix = line
                .iter()
                .zip(early)
                .all(|(expected, played)| expected == played.as_ref());
            // Strictly longer only, so the first of equal-length lines is kept.
            if is_prefix && best.is_none_or(|b| line.len() > b.moves.len()) {
                best = Some(entry);
            }
        }

        match best {
            Some(entry) => OpeningMatch {
                info: entry.info.clone(),
                matched_plies: entry.moves.len(),
            },
            None => OpeningMatch::unknown(),
        }
    }
}

/// Match against the built-in table.
pub fn match_opening<S: AsRef<str>>(moves: &[S]) -> OpeningMatch {
    DEFAULT_BOOK.match_moves(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn test_builtin_table_loads() {
        let book = OpeningBook::default();
        assert!(book.len() >= 8);
        assert_eq!(book.window(), EARLY_GAME_WINDOW);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let m = match_opening(&moves("e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4"));
        assert_eq!(m.info.name, "Ruy Lopez");
        assert_eq!(m.info.eco, "C60-C99");
        assert_eq!(m.info.rating, 9.5);
        assert_eq!(m.matched_plies, 5);
        assert!(m.is_book_ply(4));
        assert!(!m.is_book_ply(5));

        let m = match_opening(&moves("d2d4 g8f6 c2c4 e7e6 b1c3 f8b4 e2e3"));
        assert_eq!(m.info.name, "Nimzo-Indian Defense");
    }

    #[test]
    fn test_unknown_opening() {
        let m = match_opening(&moves("g2g4 e7e5 f2f3 d8h4"));
        assert!(m.info.is_unknown());
        assert_eq!(m.info.eco, "A00");
        assert!(m.info.key_ideas.is_empty());
        assert_eq!(m.info.rating, 5.0);
        assert_eq!(m.matched_plies, 0);
        assert!(!m.is_book_ply(0));

        let empty: Vec<&str> = Vec::new();
        assert!(match_opening(&empty).info.is_unknown());
    }

    #[test]
    fn test_match_is_stable_as_the_game_grows() {
        let full = moves("e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6 b1c3 a7a6 c1e3 e7e5");
        let at_two = match_opening(&full[..2]);
        assert_eq!(at_two.info.name, "Sicilian Defense");
        for n in 2..=full.len() {
            assert_eq!(match_opening(&full[..n]), at_two);
        }
    }

    #[test]
    fn test_window_limits_the_match() {
        let entries = vec![OpeningEntry {
            moves: moves("e2e4 e7e5 g1f3").into_iter().map(String::from).collect(),
            info: OpeningInfo {
                name: "King's Knight".to_string(),
                eco: "C40".to_string(),
                key_ideas: vec![],
                rating: 7.0,
            },
        }];
        let book = OpeningBook::new(entries).with_window(2);
        assert!(book.match_moves(&moves("e2e4 e7e5 g1f3")).info.is_unknown());
    }

    #[test]
    fn test_ties_go_to_the_first_entry() {
        let json = r#"[
            {"moves": ["d2d4", "d7d5"], "name": "First", "eco": "D00", "key_ideas": [], "rating": 7.0},
            {"moves": ["d2d4", "d7d5"], "name": "Second", "eco": "D00", "key_ideas": [], "rating": 8.0}
        ]"#;
        let book = OpeningBook::from_json(json).unwrap();
        assert_eq!(book.match_moves(&moves("d2d4 d7d5 c1f4")).info.name, "First");
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        assert!(matches!(
            OpeningBook::from_json("not json"),
            Err(OpeningError::Json(_))
        ));
        let json = r#"[{"moves": [], "name": "Nothing", "eco": "A00", "key_ideas": [], "rating": 1.0}]"#;
        assert!(matches!(
            OpeningBook::from_json(json),
            Err(OpeningError::EmptyLine(_))
        ));
        assert!(matches!(
            OpeningBook::load("/nonexistent/openings.json"),
            Err(OpeningError::Io(_))
        ));
    }
}
