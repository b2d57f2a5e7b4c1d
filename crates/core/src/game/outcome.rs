//! Game-over detection

use serde::Serialize;
use shakmaty::{Chess, Color, Position};

use crate::{color_name, fen};

/// Halfmoves without a capture or pawn move that end the game
const SEVENTY_FIVE_MOVE_HALFMOVES: u32 = 150;

/// Occurrences of the same position that end the game
const FIVEFOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameResult {
    /// `1-0`, `0-1` or `1/2-1/2`
    pub result: &'static str,
    pub termination: Termination,
    pub winner: Option<&'static str>,
}

impl GameResult {
    fn decisive(winner: Color) -> Self {
        Self {
            result: match winner {
                Color::White => "1-0",
                Color::Black => "0-1",
            },
            termination: Termination::Checkmate,
            winner: Some(color_name(winner)),
        }
    }

    fn draw(termination: Termination) -> Self {
        Self {
            result: "1/2-1/2",
            termination,
            winner: None,
        }
    }
}

/// Key identifying a position for repetition counting: placement, side to
/// move, castling rights and en passant square, without the move counters.
pub fn repetition_key(position: &Chess) -> String {
    fen(position)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the result if the game cannot continue from `position`.
///
/// `occurrences` is how many times the position has been reached so far.
pub fn detect(position: &Chess, occurrences: u32) -> Option<GameResult> {
    if position.is_checkmate() {
        return Some(GameResult::decisive(position.turn().other()));
    }
    if position.is_stalemate() {
        return Some(GameResult::draw(Termination::Stalemate));
    }
    if position.is_insufficient_material() {
        return Some(GameResult::draw(Termination::InsufficientMaterial));
    }
    if position.halfmoves() >= SEVENTY_FIVE_MOVE_HALFMOVES {
        return Some(GameResult::draw(Termination::SeventyFiveMoves));
    }
    if occurrences >= FIVEFOLD {
        return Some(GameResult::draw(Termination::FivefoldRepetition));
    }
    None
}
