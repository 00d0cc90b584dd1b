/// Board utility functions for tactical analysis

use shakmaty::{attacks, Bitboard, Board, Color, File, Move, Piece, Rank, Role, Square};

// Piece values for material comparison
pub const PAWN_VALUE: i32 = 1;
pub const KNIGHT_VALUE: i32 = 3;
pub const BISHOP_VALUE: i32 = 3;
pub const ROOK_VALUE: i32 = 5;
pub const QUEEN_VALUE: i32 = 9;
pub const KING_VALUE: i32 = 99;

/// Piece value (no king)
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => PAWN_VALUE,
        Role::Knight => KNIGHT_VALUE,
        Role::Bishop => BISHOP_VALUE,
        Role::Rook => ROOK_VALUE,
        Role::Queen => QUEEN_VALUE,
        Role::King => 0,
    }
}

/// Piece value including king (for fork and line comparisons)
pub fn king_value(role: Role) -> i32 {
    match role {
        Role::King => KING_VALUE,
        other => piece_value(other),
    }
}

/// Is this a ray (sliding) piece type?
pub fn is_ray_piece(role: Role) -> bool {
    matches!(role, Role::Queen | Role::Rook | Role::Bishop)
}

/// Square the moving piece ends up on. Castling moves are encoded king-takes-rook,
/// so the king's real destination is derived from the rook's side.
pub fn landing_square(mv: &Move) -> Square {
    match *mv {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            Square::from_coords(file, king.rank())
        }
        _ => mv.to(),
    }
}

pub fn home_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::First,
        Color::Black => Rank::Eighth,
    }
}

/// All sliding pieces of `color`
pub fn sliders(board: &Board, color: Color) -> Bitboard {
    (board.bishops() | board.rooks() | board.queens()) & board.by_color(color)
}

/// Squares a piece on `square` would attack with the given occupancy
pub fn attacks_with(square: Square, piece: Piece, occupied: Bitboard) -> Bitboard {
    attacks::attacks(square, piece, occupied)
}

/// Enemy pieces of `roles` standing on `targets`
pub fn enemy_on(board: &Board, targets: Bitboard, enemy: Color, roles: &[Role]) -> Bitboard {
    let mut hit = Bitboard::EMPTY;
    for sq in targets & board.by_color(enemy) {
        if let Some(piece) = board.piece_at(sq) {
            if roles.contains(&piece.role) {
                hit |= Bitboard::from_square(sq);
            }
        }
    }
    hit
}
