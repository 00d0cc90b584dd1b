use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub event: Option<String>,
    pub site: Option<String>,
    /// Starting position when the game did not begin from the standard setup
    pub fen: Option<String>,
}

impl Default for GameMetadata {
    fn default() -> Self {
        Self {
            white: "Unknown".to_string(),
            black: "Unknown".to_string(),
            result: "*".to_string(),
            date: None,
            time_control: None,
            eco: None,
            event: None,
            site: None,
            fen: None,
        }
    }
}

/// A parsed game: every move has already been replayed and is legal.
#[derive(Debug, Clone)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub start: Chess,
    pub moves: Vec<Move>,
    pub san_moves: Vec<String>, // SAN notation, without check suffixes
    pub pgn: String,
}

impl GameData {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Moves in UCI coordinate notation (standard castling, e.g. `e1g1`).
    pub fn uci_moves(&self) -> Vec<String> {
        self.moves.iter().map(to_uci).collect()
    }

    /// Whether the game begins from the standard initial position.
    pub fn starts_from_standard_position(&self) -> bool {
        fen_of(&self.start) == fen_of(&Chess::default())
    }
}

/// Which side played a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    White,
    Black,
}

impl From<Color> for Player {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Player::White,
            Color::Black => Player::Black,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::White => f.write_str("White"),
            Player::Black => f.write_str("Black"),
        }
    }
}

pub fn to_uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

/// Full FEN of a position.
pub fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// SAN of `mv` played from `before`, with `+`/`#` taken from the resulting position.
pub fn san_with_suffix(before: &Chess, mv: &Move, after: &Chess) -> String {
    let mut san = San::from_move(before, mv.clone()).to_string();
    if after.is_checkmate() {
        san.push('#');
    } else if after.is_check() {
        san.push('+');
    }
    san
}
