/// Line geometry detectors: pin, skewer
///
/// Both look along the moved slider's rays: the first enemy piece hit is the
/// front piece, and the next piece on the same ray is found by attacking again
/// with the front piece lifted off the board.

use shakmaty::{Bitboard, Position};

use crate::board_utils::{attacks_with, is_ray_piece, king_value};
use crate::tactics::MoveContext;

/// (front value, behind value) for every enemy-enemy pair on the moved slider's lines
fn aligned_pairs(ctx: &MoveContext) -> Vec<(i32, i32)> {
    let Some(piece) = ctx.moved_piece() else {
        return Vec::new();
    };
    if !is_ray_piece(piece.role) {
        return Vec::new();
    }

    let board = ctx.after.board();
    let occupied = board.occupied();
    let enemy = board.by_color(ctx.enemy());
    let direct = attacks_with(ctx.landing, piece, occupied);

    let mut pairs = Vec::new();
    for front in direct & enemy {
        let lifted = occupied & !Bitboard::from_square(front);
        let behind = attacks_with(ctx.landing, piece, lifted) & !direct & occupied;
        for sq in behind & enemy {
            if let (Some(f), Some(b)) = (board.piece_at(front), board.piece_at(sq)) {
                pairs.push((king_value(f.role), king_value(b.role)));
            }
        }
    }
    pairs
}

/// Attacked piece shields a more valuable one behind it
pub fn pin(ctx: &MoveContext) -> bool {
    aligned_pairs(ctx)
        .iter()
        .any(|(front, behind)| front < behind)
}

/// Attacked piece is worth more than the one it exposes
pub fn skewer(ctx: &MoveContext) -> bool {
    aligned_pairs(ctx)
        .iter()
        .any(|(front, behind)| front > behind)
}
