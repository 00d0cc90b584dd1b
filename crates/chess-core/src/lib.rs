//! Game input and reference data for the review pipeline.
//!
//! `pgn` turns movetext into a replayed [`game_data::GameData`], and
//! `openings` matches the early move prefix against the opening table.

pub mod game_data;
pub mod openings;
pub mod pgn;
