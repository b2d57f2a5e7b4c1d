//! Alternative-move suggestions for the player's last move

use std::time::Duration;

use serde::{Serialize, Serializer};
use shakmaty::uci::UciMove;
use shakmaty::Chess;
use tracing::{debug, warn};

use crate::engine::{Engine, EngineError, Evaluation};
use crate::fen;
use crate::oracle::{explain, Annotation, Oracle, PromptTemplate};

/// One suggested alternative with its commentary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackEntry {
    #[serde(rename = "move", serialize_with = "serialize_uci")]
    pub mv: UciMove,
    pub evaluation: Evaluation,
    pub explanation: Annotation,
}

pub(crate) fn serialize_uci<S: Serializer>(mv: &UciMove, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(mv)
}

/// Suggests the engine's top alternatives to `played`, each with a one-line reason.
///
/// `position` is the position the player moved from. Entries follow the
/// engine's ranking; the scores are kept but not used for ordering. A failed
/// explanation only degrades its own entry. An engine failure is returned
/// as-is: the engine is the same process that has to answer next.
pub async fn suggest_alternatives<E, O>(
    engine: &mut E,
    oracle: &O,
    position: &Chess,
    played: &UciMove,
    lines: usize,
    budget: Duration,
) -> Result<Vec<FeedbackEntry>, EngineError>
where
    E: Engine + ?Sized,
    O: Oracle + ?Sized,
{
    let fen = fen(position);
    let candidates = engine.analyze_top_n(&fen, lines, budget).await?;
    debug!(count = candidates.len(), "alternatives from engine");

    let played_str = played.to_string();
    let mut entries = Vec::with_capacity(candidates.len());

    for candidate in candidates.into_iter().take(lines) {
        if candidate.mv.to_move(position).is_err() {
            warn!(mv = %candidate.mv, fen = fen.as_str(), "engine suggested an illegal move; skipping");
            continue;
        }

        let candidate_str = candidate.mv.to_string();
        let explanation = explain(
            oracle,
            &PromptTemplate::BetterMove {
                fen: &fen,
                played: &played_str,
                candidate: &candidate_str,
            },
        )
        .await;

        entries.push(FeedbackEntry {
            mv: candidate.mv,
            evaluation: candidate.evaluation,
            explanation,
        });
    }

    Ok(entries)
}

/// Renders suggestions the way the side panel shows them
pub fn format_suggestions(played: &UciMove, entries: &[FeedbackEntry]) -> String {
    let mut out = format!("Instead of {}, consider:\n", played);
    for entry in entries {
        out.push_str(&format!("{}: {}\n", entry.mv, entry.explanation));
    }
    out
}
