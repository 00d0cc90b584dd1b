//! End-to-end game reviews driven by a scripted evaluator.
//!
//! No Stockfish binary is needed: every evaluation comes from a canned script
//! or from the limited-mode engine.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};

use chess_core::game_data::Player;
use chess_core::openings::OpeningBook;
use game_review::analysis::Category;
use game_review::analyzer::{AnalysisOptions, GameAnalyzer};
use game_review::engine::{Engine, LIMITED_MODE_WARNING};
use game_review::tactics::Motif;
use game_review::{analyze_shared, tutor};

use common::{eval, ScriptedEvaluator};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn analyzer<'a>() -> GameAnalyzer<'a> {
    GameAnalyzer::new(AnalysisOptions::default())
}

#[tokio::test]
async fn test_single_best_move() {
    let mut engine = ScriptedEvaluator::new().ply(eval(0.3, Some("e2e4")), eval(0.3, None));
    let report = analyzer().analyze_pgn(&mut engine, "1. e4").await.unwrap();

    assert_eq!(report.moves.len(), 1);
    let first = &report.moves[0];
    assert_eq!(first.ply, 1);
    assert_eq!(first.player, Player::White);
    assert_eq!(first.san, "e4");
    assert_eq!(first.uci, "e2e4");
    assert!(first.is_best);
    assert!(!first.is_book);
    assert_eq!(first.classification.category, Category::Best);
    assert_eq!(first.classification.centipawn_loss, 0);

    assert_eq!(report.summary.white.stats.total_moves, 1);
    assert_eq!(report.summary.white.stats.accuracy, 100.0);
    assert_eq!(report.summary.white.stats.average_centipawn_loss, 0.0);
    assert!(report.summary.white.estimated_rating.is_some());
    assert_eq!(report.summary.black.stats.total_moves, 0);
    assert_eq!(report.summary.black.estimated_rating, None);

    assert!(report.opening.is_unknown());
    assert_eq!(report.evaluation_trend, vec![0.3, 0.3]);
    assert!(report.engine_available);
    assert!(report.complete);
}

#[tokio::test]
async fn test_two_evaluations_per_ply() {
    let mut engine = ScriptedEvaluator::new();
    let report = analyzer()
        .analyze_pgn(&mut engine, "1. d4 d5 2. Bf4 Nf6 3. e3")
        .await
        .unwrap();

    assert_eq!(report.moves.len(), 5);
    assert_eq!(engine.calls.len(), 10);
    assert_eq!(engine.calls[0].0, START_FEN);
    for (i, (_, multipv)) in engine.calls.iter().enumerate() {
        let expected = if i % 2 == 0 { 3 } else { 1 };
        assert_eq!(*multipv, expected, "call {i}");
    }
    // The position after one ply is the position before the next.
    for ply in 0..4 {
        assert_eq!(engine.calls[2 * ply + 1].0, engine.calls[2 * ply + 2].0);
    }
    assert_eq!(report.moves[4].fen_after, engine.calls[9].0);
}

#[tokio::test]
async fn test_queen_blunder() {
    let mut engine = ScriptedEvaluator::new()
        .ply(eval(0.3, Some("e2e4")), eval(0.3, None))
        .ply(eval(0.3, Some("e7e5")), eval(0.3, None))
        .ply(eval(0.3, Some("g1f3")), eval(0.0, None))
        .ply(eval(0.0, Some("b8c6")), eval(0.0, None))
        .ply(eval(0.2, Some("f1c4")), eval(-9.0, None))
        .ply(eval(-9.0, Some("e8f7")), eval(-9.0, None));

    let report = analyzer()
        .analyze_pgn(&mut engine, "1. e4 e5 2. Qh5 Nc6 3. Qxf7+ Kxf7")
        .await
        .unwrap();

    let categories: Vec<Category> = report
        .moves
        .iter()
        .map(|m| m.classification.category)
        .collect();
    assert_eq!(
        categories,
        vec![
            Category::Best,
            Category::Best,
            Category::Good,
            Category::Best,
            Category::Blunder,
            Category::Best,
        ]
    );

    let blunder = &report.moves[4];
    assert_eq!(blunder.san, "Qxf7+");
    assert_eq!(blunder.classification.centipawn_loss, 920);
    assert_eq!(blunder.best_move.as_deref(), Some("f1c4"));
    assert_eq!(blunder.best_move_san.as_deref(), Some("Bc4"));
    assert!(blunder.motifs.contains(&Motif::Capture));
    assert!(blunder.motifs.contains(&Motif::Check));
    assert!(tutor::explain(blunder).contains("Better was Bc4"));

    let white = &report.summary.white.stats;
    assert_eq!(white.total_moves, 3);
    assert_eq!(white.histogram.get(Category::Blunder), 1);
    assert!((white.accuracy - 200.0 / 3.0).abs() < 1e-9);
    assert!((white.average_centipawn_loss - 950.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.summary.black.stats.accuracy, 100.0);

    // Qh5 pins the f7 pawn to the king.
    assert_eq!(report.moves[2].motifs, vec![Motif::Pin]);
    let highlighted: Vec<usize> = report.motifs.iter().map(|h| h.ply).collect();
    assert_eq!(highlighted, vec![3, 5, 6]);
    assert_eq!(report.motifs[1].player, Player::White);
    assert_eq!(report.motifs[2].player, Player::Black);
}

#[tokio::test]
async fn test_ruy_lopez_is_theory() {
    let mut engine = ScriptedEvaluator::new();
    let report = analyzer()
        .analyze_pgn(&mut engine, "1. e4 e5 2. Nf3 Nc6 3. Bb5")
        .await
        .unwrap();

    assert_eq!(report.opening.name, "Ruy Lopez");
    assert_eq!(report.opening.eco, "C60-C99");
    for record in &report.moves {
        assert!(record.is_book);
        assert_eq!(record.classification.category, Category::Theory);
        assert_eq!(record.classification.centipawn_loss, 0);
    }
    assert_eq!(report.summary.white.stats.histogram.theory, 3);
    assert_eq!(report.summary.black.stats.histogram.theory, 2);
    assert_eq!(report.summary.phases.opening.total_moves, 5);
    assert_eq!(report.summary.phases.opening.accuracy, 100.0);
}

#[tokio::test]
async fn test_limited_mode() {
    let mut engine = Engine::Unavailable;
    let report = analyzer()
        .analyze_pgn(&mut engine, "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6")
        .await
        .unwrap();

    assert!(!report.engine_available);
    assert_eq!(report.warnings, vec![LIMITED_MODE_WARNING.to_string()]);
    assert_eq!(report.evaluation_trend, vec![0.0; 7]);

    let categories: Vec<Category> = report
        .moves
        .iter()
        .map(|m| m.classification.category)
        .collect();
    assert_eq!(categories[..5], [Category::Theory; 5]);
    assert_eq!(categories[5], Category::Great);
    assert!(report.moves.iter().all(|m| m.best_move.is_none()));
}

#[tokio::test]
async fn test_scholars_mate_motifs() {
    let mut engine = Engine::Unavailable;
    let report = analyzer()
        .analyze_pgn(
            &mut engine,
            "[White \"A\"]\n[Black \"B\"]\n[Result \"1-0\"]\n\n1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0",
        )
        .await
        .unwrap();

    assert_eq!(report.metadata.white, "A");
    assert_eq!(report.metadata.result, "1-0");
    let mate = report.moves.last().unwrap();
    assert_eq!(mate.ply, 7);
    assert_eq!(mate.move_number, 4);
    assert_eq!(mate.san, "Qxf7#");
    assert!(mate.motifs.contains(&Motif::Checkmate));
    assert!(mate.motifs.contains(&Motif::Capture));
}

#[tokio::test]
async fn test_invalid_pgn() {
    let mut engine = ScriptedEvaluator::new();
    assert!(analyzer().analyze_pgn(&mut engine, "").await.is_none());
    assert!(analyzer().analyze_pgn(&mut engine, "1. e4 Ke7 2. Ke3 Kd5 3. Qxd8").await.is_none());
    assert!(engine.calls.is_empty());
}

#[tokio::test]
async fn test_failed_evaluation_is_neutral() {
    let mut engine = ScriptedEvaluator::new()
        .ply(eval(0.3, Some("e2e4")), eval(0.3, None))
        .ply(eval(0.3, Some("e7e5")), eval(0.3, None))
        .failing_on(2);

    let report = analyzer()
        .analyze_pgn(&mut engine, "1. e4 e5")
        .await
        .unwrap();

    assert!(report.complete);
    assert_eq!(report.moves.len(), 2);
    assert_eq!(report.moves[1].eval_before, 0.0);
    assert_eq!(report.moves[1].best_move, None);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("failed"));
}

#[tokio::test]
async fn test_cancellation_keeps_the_finished_prefix() {
    let cancel = AtomicBool::new(false);
    let mut engine = ScriptedEvaluator::new();
    let report = GameAnalyzer::new(AnalysisOptions::default())
        .with_cancel(&cancel)
        .on_progress(|fraction| {
            if fraction >= 0.5 {
                cancel.store(true, Ordering::Relaxed);
            }
        })
        .analyze_pgn(&mut engine, "1. e4 e5 2. Nf3 Nc6")
        .await
        .unwrap();

    assert!(!report.complete);
    assert_eq!(report.moves.len(), 2);
    assert_eq!(report.evaluation_trend.len(), 3);
    assert_eq!(engine.calls.len(), 4);
    assert_eq!(report.summary.white.stats.total_moves, 1);
}

#[tokio::test]
async fn test_progress_reports_each_ply() {
    let mut seen = Vec::new();
    let mut engine = ScriptedEvaluator::new();
    let mut analyzer = GameAnalyzer::new(AnalysisOptions::default()).on_progress(|f| seen.push(f));
    analyzer.analyze_pgn(&mut engine, "1. e4 e5 2. Nf3 Nc6").await.unwrap();
    drop(analyzer);

    assert_eq!(seen, vec![0.25, 0.5, 0.75, 1.0]);
}

#[tokio::test]
async fn test_custom_book() {
    let book = OpeningBook::from_json(
        r#"[{"moves": ["e2e4", "e7e5"], "name": "Open Game", "eco": "C20", "key_ideas": ["Centre"], "rating": 8.0}]"#,
    )
    .unwrap();
    let mut engine = ScriptedEvaluator::new();
    let report = GameAnalyzer::new(AnalysisOptions::default())
        .with_book(&book)
        .analyze_pgn(&mut engine, "1. e4 e5 2. Nf3")
        .await
        .unwrap();

    assert_eq!(report.opening.name, "Open Game");
    assert_eq!(report.opening.key_ideas, vec!["Centre".to_string()]);
    assert!(report.moves[1].is_book);
    assert!(!report.moves[2].is_book);
}

#[tokio::test]
async fn test_setup_position_has_no_opening() {
    // 1. c4 spells the English Opening, but not from the initial position.
    let pgn = "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/2P5/4K3 w - - 0 1\"]\n\n1. c4 Kd7 *";
    let mut engine = ScriptedEvaluator::new();
    let report = analyzer().analyze_pgn(&mut engine, pgn).await.unwrap();

    assert!(report.opening.is_unknown());
    assert_eq!(report.moves.len(), 2);
    for record in &report.moves {
        assert!(!record.is_book);
        assert_ne!(record.classification.category, Category::Theory);
    }
}

#[tokio::test]
async fn test_shared_engine() {
    let engine = tokio::sync::Mutex::new(ScriptedEvaluator::new());
    let mut analyzer = analyzer();

    let first = analyze_shared(&engine, &mut analyzer, "1. e4 e5").await.unwrap();
    let second = analyze_shared(&engine, &mut analyzer, "1. d4").await.unwrap();

    assert_eq!(first.moves.len(), 2);
    assert_eq!(second.moves.len(), 1);
    assert_eq!(engine.lock().await.calls.len(), 6);
}
