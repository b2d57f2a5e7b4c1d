//! Adaptive Chess Core Library
//!
//! Plays a human against a UCI engine whose style adapts to the player's
//! opening, and explains better alternatives after every player move.

use serde::Serialize;
use shakmaty::{fen::Fen, CastlingMode, Chess, EnPassantMode, Position};

pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod game;
pub mod oracle;
pub mod style;
pub mod trivia;

pub use config::{Config, GameConfig};
pub use engine::{Engine, UciEngine};
pub use error::{Error, Result};
pub use feedback::FeedbackEntry;
pub use game::{Game, GameError, GameSnapshot, Phase, TurnReport};
pub use oracle::{Annotation, GeminiClient, Oracle};
pub use shakmaty::Color;
pub use style::StyleCategory;

/// Basic position information for display
#[derive(Debug, Clone, Serialize)]
pub struct PositionInfo {
    pub fen: String,
    pub side_to_move: &'static str,
    /// Legal moves in UCI notation
    pub legal_moves: Vec<String>,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
}

/// Analyzes a chess position
pub fn analyze_position(position: &Chess) -> PositionInfo {
    let legal_moves = position
        .legal_moves()
        .iter()
        .map(|m| m.to_uci(CastlingMode::Standard).to_string())
        .collect();

    PositionInfo {
        fen: fen(position),
        side_to_move: color_name(position.turn()),
        legal_moves,
        is_check: position.is_check(),
        is_checkmate: position.is_checkmate(),
        is_stalemate: position.is_stalemate(),
    }
}

/// FEN snapshot handed to the engine and the oracle
pub fn fen(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

/// Creates the standard starting position
pub fn starting_position() -> Chess {
    Chess::default()
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
