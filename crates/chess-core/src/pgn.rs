//! PGN parsing: a lightweight regex tokenizer over the movetext.
//!
//! Tag pairs are read with a regex, the movetext is stripped of comments,
//! variations and NAGs, and the remaining SAN tokens are replayed with shakmaty
//! so that every returned move is legal in its position.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Position};
use thiserror::Error;

use crate::game_data::{GameData, GameMetadata};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header regex"));
static HEADER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("header line regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}|;[^\n]*").expect("comment regex"));
// Innermost variation only; applied until nothing matches.
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("variation regex"));
static NAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d+").expect("nag regex"));
static MOVE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.(?:\.\.)?").expect("move number regex"));
// Promotion written without `=`, e.g. `e8Q` or `dxc1N+`.
static BARE_PROMOTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-h](?:x[a-h])?[18])([QRBN])([+#]?)$").expect("promotion regex")
});
static SAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?|O-O-O|O-O)[+#]?$")
        .expect("san regex")
});

const RESULT_TOKENS: &[&str] = &["1-0", "0-1", "1/2-1/2", "*"];
const EN_PASSANT_MARK: &str = "e.p.";

#[derive(Debug, Error, PartialEq)]
pub enum PgnError {
    #[error("PGN contains no moves")]
    Empty,

    #[error("Unexpected token in movetext: {0}")]
    UnexpectedToken(String),

    #[error("Invalid SAN '{0}'")]
    InvalidSan(String),

    #[error("Illegal move '{san}' at ply {ply}")]
    IllegalMove { san: String, ply: usize },

    #[error("Invalid FEN '{0}'")]
    InvalidFen(String),
}

/// Parse the first game of a PGN string.
pub fn parse_pgn(pgn: &str) -> Result<GameData, PgnError> {
    let (tags, movetext) = first_game(pgn);
    let mut metadata = GameMetadata::default();

    for cap in HEADER_RE.captures_iter(&tags) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Date" => metadata.date = Some(value),
            "TimeControl" => metadata.time_control = Some(value),
            "ECO" => metadata.eco = Some(value),
            "Event" => metadata.event = Some(value),
            "Site" => metadata.site = Some(value),
            "FEN" => metadata.fen = Some(value),
            _ => {}
        }
    }
    let setup = extract_header(&tags, "SetUp");

    // A FEN tag without SetUp is tolerated; SetUp "0" means the standard start.
    if setup.as_deref() == Some("0") {
        metadata.fen = None;
    }
    let start = match &metadata.fen {
        Some(fen) => start_position(fen)?,
        None => Chess::default(),
    };

    let tokens = extract_san_tokens(&movetext)?;
    if tokens.is_empty() {
        return Err(PgnError::Empty);
    }

    let mut pos = start.clone();
    let mut moves = Vec::with_capacity(tokens.len());
    let mut san_moves = Vec::with_capacity(tokens.len());

    for (ply, token) in tokens.iter().enumerate() {
        let san_plus: SanPlus = token
            .parse()
            .map_err(|_| PgnError::InvalidSan(token.clone()))?;
        let mv = san_plus
            .san
            .to_move(&pos)
            .map_err(|_| PgnError::IllegalMove {
                san: token.clone(),
                ply: ply + 1,
            })?;
        san_moves.push(san_plus.san.to_string());
        pos.play_unchecked(mv.clone());
        moves.push(mv);
    }

    Ok(GameData {
        metadata,
        start,
        moves,
        san_moves,
        pgn: pgn.to_string(),
    })
}

fn start_position(fen: &str) -> Result<Chess, PgnError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|_| PgnError::InvalidFen(fen.to_string()))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|_| PgnError::InvalidFen(fen.to_string()))
}

/// Split off the tag section and movetext of the first game.
/// Tag lines after the movetext has started belong to the next game.
fn first_game(pgn: &str) -> (String, String) {
    let mut tags = String::new();
    let mut movetext = String::new();
    for line in pgn.lines() {
        if line.trim_start().starts_with('[') {
            if !movetext.trim().is_empty() {
                break;
            }
            tags.push_str(line);
            tags.push('\n');
            // Movetext may follow the tags on the same line.
            let rest = HEADER_LINE_RE.replace_all(line, " ");
            movetext.push_str(&rest);
        } else {
            movetext.push_str(line);
        }
        movetext.push('\n');
    }
    (tags, movetext)
}

/// Extract SAN tokens from a game's movetext.
/// Stops at the game termination marker; any other unrecognised token is an error.
fn extract_san_tokens(pgn: &str) -> Result<Vec<String>, PgnError> {
    let no_headers = HEADER_LINE_RE.replace_all(pgn, " ");
    let mut text = COMMENT_RE.replace_all(&no_headers, " ").into_owned();

    while VARIATION_RE.is_match(&text) {
        text = VARIATION_RE.replace_all(&text, " ").into_owned();
    }

    let text = NAG_RE.replace_all(&text, " ");
    let text = MOVE_NUMBER_RE.replace_all(&text, " ");

    let mut tokens = Vec::new();
    for raw in text.split_whitespace() {
        if RESULT_TOKENS.contains(&raw) {
            break;
        }
        let token = raw
            .trim_end_matches(EN_PASSANT_MARK)
            .trim_end_matches(|c: char| c == '!' || c == '?')
            .replace("0-0-0", "O-O-O")
            .replace("0-0", "O-O");
        if token.is_empty() {
            continue;
        }
        let token = BARE_PROMOTION_RE.replace(&token, "$1=$2$3").into_owned();
        if !SAN_RE.is_match(&token) {
            return Err(PgnError::UnexpectedToken(raw.to_string()));
        }
        tokens.push(token);
    }
    Ok(tokens)
}

/// Extract a string value from a PGN header (e.g. WhiteElo, Opening).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}
