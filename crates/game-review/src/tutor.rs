//! Plain-language explanations for analysed moves.

use crate::analysis::Category;
use crate::analyzer::MoveRecord;

/// Longer teaching text for one move.
pub fn explain(record: &MoveRecord) -> String {
    let san = &record.san;
    let loss = record.classification.centipawn_loss;

    let mut text = match record.classification.category {
        Category::Brilliant => format!(
            "{san} is a brilliant find. It was not the engine's first choice, yet it improves \
             your position. Moves like this often involve a sacrifice or a quiet idea that is \
             easy to miss."
        ),
        Category::Great => format!(
            "{san} is a great move. It differs from the engine's top line but costs almost \
             nothing ({loss} centipawns)."
        ),
        Category::Best => format!("{san} is the best move in the position."),
        Category::Excellent => format!(
            "{san} is excellent, only {loss} centipawns away from the best continuation."
        ),
        Category::Good => format!(
            "{san} is a good, practical move. It gives up {loss} centipawns, which rarely \
             matters over the board."
        ),
        Category::Theory => format!(
            "{san} is a known opening move. Learning the ideas behind the opening matters more \
             than memorising the moves."
        ),
        Category::Inaccuracy => format!(
            "{san} is an inaccuracy that costs {loss} centipawns. Better was {}. Look for moves \
             that improve your worst-placed piece.",
            better_move(record)
        ),
        Category::Mistake => format!(
            "{san} is a mistake that costs {loss} centipawns. Better was {}. Before moving, ask \
             what your opponent threatens.",
            better_move(record)
        ),
        Category::Blunder => format!(
            "{san} is a blunder that costs {loss} centipawns. Better was {}. Check every \
             capture, check and attack your move allows.",
            better_move(record)
        ),
    };

    if !record.motifs.is_empty() {
        let labels: Vec<&str> = record.motifs.iter().map(|m| m.label()).collect();
        text.push_str(&format!(" Tactics: {}.", labels.join(", ")));
    }
    text
}

fn better_move(record: &MoveRecord) -> &str {
    record
        .best_move_san
        .as_deref()
        .or(record.best_move.as_deref())
        .unwrap_or("N/A")
}
