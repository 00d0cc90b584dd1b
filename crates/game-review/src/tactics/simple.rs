/// Simple detectors: capture, winning_capture, check, checkmate, back_rank

use shakmaty::{attacks, Position};

use crate::board_utils::{home_rank, piece_value};
use crate::tactics::MoveContext;

/// The move takes an enemy piece (en passant included)
pub fn capture(ctx: &MoveContext) -> bool {
    ctx.mv.is_capture()
}

/// Captured piece is worth more than the piece that took it
pub fn winning_capture(ctx: &MoveContext) -> bool {
    match ctx.mv.capture() {
        Some(captured) => piece_value(captured) > piece_value(ctx.mv.role()),
        None => false,
    }
}

pub fn check(ctx: &MoveContext) -> bool {
    ctx.after.is_check()
}

pub fn checkmate(ctx: &MoveContext) -> bool {
    ctx.after.is_checkmate()
}

/// Checked king on its home rank with no flight square the attacker does not cover
pub fn back_rank(ctx: &MoveContext) -> bool {
    if !ctx.after.is_check() {
        return false;
    }

    let board = ctx.after.board();
    let defender = ctx.enemy();
    let Some(king) = board.king_of(defender) else {
        return false;
    };
    if king.rank() != home_rank(defender) {
        return false;
    }

    // Without the king, so squares behind it along a checking line count as covered.
    let occupied = board.occupied() ^ king;
    let flights = attacks::king_attacks(king) & !board.by_color(defender);
    flights
        .into_iter()
        .all(|sq| board.attacks_to(sq, ctx.mover, occupied).any())
}
