//! Style-selection state machine

use serde::Serialize;

use super::outcome::GameResult;
use crate::style::{StyleCategory, OPENING_MOVES};

/// Why the game stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GameEnd {
    /// Decided by the rules of chess
    Finished(GameResult),
    /// Stopped by an engine failure
    Aborted { reason: String },
}

impl GameEnd {
    /// Result string for display, `*` when aborted
    pub fn result(&self) -> &str {
        match self {
            GameEnd::Finished(result) => result.result,
            GameEnd::Aborted { .. } => "*",
        }
    }
}

/// Where the game is in choosing the engine's style.
///
/// `UnstyledWarmup` -> `StyleLocking` once the player has made their third
/// move -> `Styled` after the engine is reconfigured. Any phase can move to
/// `GameOver`, which is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum Phase {
    UnstyledWarmup,
    StyleLocking,
    Styled(StyleCategory),
    GameOver(GameEnd),
}

impl Phase {
    /// Phase once the player's move number `human_moves` has been recorded
    pub fn after_human_move(&self, human_moves: usize) -> Phase {
        match self {
            Phase::UnstyledWarmup if human_moves >= OPENING_MOVES => Phase::StyleLocking,
            other => other.clone(),
        }
    }

    /// Locks the style. Only the first lock takes effect; later calls return
    /// the style already locked. Returns `None` once the game is over.
    pub fn lock(&mut self, style: StyleCategory) -> Option<StyleCategory> {
        match self {
            Phase::UnstyledWarmup | Phase::StyleLocking => {
                *self = Phase::Styled(style);
                Some(style)
            }
            Phase::Styled(locked) => Some(*locked),
            Phase::GameOver(_) => None,
        }
    }

    pub fn style(&self) -> Option<StyleCategory> {
        match self {
            Phase::Styled(style) => Some(*style),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self, Phase::GameOver(_))
    }
}
