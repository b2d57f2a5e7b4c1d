//! Chess engine integration
//!
//! Provides the session interface the game drives and its UCI implementation.

pub mod analysis;
pub mod uci;

use std::time::Duration;

use async_trait::async_trait;
use shakmaty::uci::UciMove;

// Re-export main types for convenience
pub use analysis::{CandidateMove, Evaluation};
pub use uci::{EngineError, UciEngine};

/// A long-lived connection to a move-search engine.
///
/// Every call blocks the caller until the engine answers or the budget
/// (plus the implementation's grace period) runs out. Positions are passed
/// as FEN snapshots; the session never owns game state.
#[async_trait]
pub trait Engine: Send {
    /// Best move for the side to move, searching for `budget`
    async fn best_move(&mut self, fen: &str, budget: Duration) -> Result<UciMove, EngineError>;

    /// Up to `lines` independent candidate lines, best first
    async fn analyze_top_n(
        &mut self,
        fen: &str,
        lines: usize,
        budget: Duration,
    ) -> Result<Vec<CandidateMove>, EngineError>;

    /// Applies engine parameters; on failure the previous values stay in effect
    async fn configure(&mut self, options: &[(&str, &str)]) -> Result<(), EngineError>;

    /// Terminates the engine process. Safe to call more than once.
    async fn quit(&mut self);
}
