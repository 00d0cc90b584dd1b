/// Attack detectors: fork, double_attack, discovered_attack, discovered_check

use shakmaty::{Bitboard, Position, Role};

use crate::board_utils::{attacks_with, enemy_on, sliders};
use crate::tactics::MoveContext;

const FORK_TARGETS: &[Role] = &[Role::Rook, Role::Queen, Role::King];
const HEAVY_PIECES: &[Role] = &[Role::Rook, Role::Queen];

/// Enemy heavy pieces (and king) the moved piece attacks from its landing square
fn attacked_targets(ctx: &MoveContext, roles: &[Role]) -> Bitboard {
    let board = ctx.after.board();
    enemy_on(board, board.attacks_from(ctx.landing), ctx.enemy(), roles)
}

/// Moved piece attacks two or more of rook, queen and king
pub fn fork(ctx: &MoveContext) -> bool {
    attacked_targets(ctx, FORK_TARGETS).count() >= 2
}

/// A fork, or a check while the moved piece also hits a rook or queen
pub fn double_attack(ctx: &MoveContext) -> bool {
    fork(ctx) || (ctx.after.is_check() && attacked_targets(ctx, HEAVY_PIECES).any())
}

/// Squares friendly sliders gained because the moved piece left its origin
fn uncovered(ctx: &MoveContext) -> Bitboard {
    if ctx.mv.is_castle() {
        return Bitboard::EMPTY;
    }
    let Some(from) = ctx.mv.from() else {
        return Bitboard::EMPTY;
    };

    let board = ctx.after.board();
    let occupied = board.occupied();
    let blocked = occupied | Bitboard::from_square(from);

    let mut gained = Bitboard::EMPTY;
    for sq in sliders(board, ctx.mover) & !Bitboard::from_square(ctx.landing) {
        let Some(piece) = board.piece_at(sq) else {
            continue;
        };
        gained |= attacks_with(sq, piece, occupied) & !attacks_with(sq, piece, blocked);
    }
    gained
}

/// Moving away opened a friendly line onto an enemy piece
///
/// Lines that only reach empty squares do not count.
pub fn discovered_attack(ctx: &MoveContext) -> bool {
    (uncovered(ctx) & ctx.after.board().by_color(ctx.enemy())).any()
}

/// Moving away opened a friendly line onto the enemy king
pub fn discovered_check(ctx: &MoveContext) -> bool {
    match ctx.after.board().king_of(ctx.enemy()) {
        Some(king) => uncovered(ctx).contains(king),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::tactics::test_support::motifs_for;
    use crate::tactics::Motif;

    #[test]
    fn test_discovered_check() {
        let motifs = motifs_for("4k3/8/8/8/4B3/8/8/4R1K1 w - - 0 1", "e4b7");
        assert_eq!(
            motifs,
            vec![Motif::Check, Motif::DiscoveredAttack, Motif::DiscoveredCheck]
        );
    }

    #[test]
    fn test_discovered_attack_on_queen() {
        // Knight leaves d4 and the rook on d1 now hits the queen on d8.
        let motifs = motifs_for("3qk3/8/8/8/3N4/8/8/3RK3 w - - 0 1", "d4b5");
        assert_eq!(motifs, vec![Motif::DiscoveredAttack]);
    }

    #[test]
    fn test_opened_line_onto_empty_squares_is_not_discovered() {
        // The d-file opens for the rook but nothing stands on it.
        assert!(motifs_for("4k3/8/8/8/8/8/3N4/3RK3 w - - 0 1", "d2b3").is_empty());
    }

    #[test]
    fn test_rook_fork() {
        // Rook lands on d5 hitting the queen on a5 and the rook on d8.
        let motifs = motifs_for("3r2k1/8/8/q7/8/8/8/3R2K1 w - - 0 1", "d1d5");
        assert_eq!(motifs, vec![Motif::Fork, Motif::DoubleAttack]);
    }

    #[test]
    fn test_discovered_check_while_hitting_a_rook() {
        // Bd5 uncovers the e-file check and keeps the a8 rook under attack.
        let motifs = motifs_for("r3k3/8/8/8/4B3/8/8/4R1K1 w - - 0 1", "e4d5");
        assert_eq!(
            motifs,
            vec![
                Motif::Check,
                Motif::DoubleAttack,
                Motif::DiscoveredAttack,
                Motif::DiscoveredCheck
            ]
        );
    }
}
