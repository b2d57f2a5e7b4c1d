//! Natural-language commentary from a generative text service

mod client;
mod types;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

pub use client::{GeminiClient, DEFAULT_MODEL, GEMINI_API_BASE};
pub use types::*;

use crate::error::Result;

/// String-in, string-out text generation
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Outcome of asking the oracle for commentary.
///
/// A failed call never aborts the game; it becomes `Degraded` and is shown
/// as a placeholder instead of real text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "lowercase")]
pub enum Annotation {
    Text(String),
    Degraded(String),
}

impl Annotation {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Annotation::Degraded(_))
    }

    /// Text to show, using `prefix` in front of the failure reason
    pub fn or_placeholder(&self, prefix: &str) -> String {
        match self {
            Annotation::Text(text) => text.clone(),
            Annotation::Degraded(reason) => format!("{}: {}", prefix, reason),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.or_placeholder("Error generating explanation"))
    }
}

/// The prompts the game sends, with their substitutions
#[derive(Debug, Clone, PartialEq)]
pub enum PromptTemplate<'a> {
    /// Why the engine's own move is strong
    EngineMoveRationale { fen: &'a str, engine_move: &'a str },
    /// Why `candidate` beats the move the player actually made
    BetterMove {
        fen: &'a str,
        played: &'a str,
        candidate: &'a str,
    },
}

impl PromptTemplate<'_> {
    pub fn render(&self) -> String {
        match self {
            PromptTemplate::EngineMoveRationale { fen, engine_move } => format!(
                "Chess board position: {fen}. AI played {engine_move}. \
                 Why is this a strong move based on the position?"
            ),
            PromptTemplate::BetterMove {
                fen,
                played,
                candidate,
            } => format!(
                "Chess position: {fen}. The player moved {played}, but a stronger move was \
                 {candidate}. Explain in 1 line why {candidate} is a better choice based on \
                 future moves prediction and it should be short and simple for even 8 year \
                 old to understand."
            ),
        }
    }
}

/// Asks the oracle for commentary, turning any failure into `Degraded`
pub async fn explain<O: Oracle + ?Sized>(oracle: &O, template: &PromptTemplate<'_>) -> Annotation {
    let request = GenerationRequest::new(template.render());
    match oracle.generate(&request).await {
        Ok(text) => Annotation::Text(text),
        Err(e) => {
            warn!(error = %e, "commentary request failed");
            Annotation::Degraded(e.to_string())
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted oracle for tests

    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;

    /// Answers every prompt, failing when the prompt contains a marker
    pub struct ScriptedOracle {
        pub fail_on: Option<String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedOracle {
        pub fn new() -> Self {
            Self {
                fail_on: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_on(marker: &str) -> Self {
            Self {
                fail_on: Some(marker.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            match &self.fail_on {
                Some(marker) if request.prompt.contains(marker.as_str()) => {
                    Err(Error::Oracle("503 Service Unavailable - overloaded".into()))
                }
                _ => Ok(format!("because of {}", request.prompt.len())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedOracle;
    use super::*;

    #[test]
    fn test_better_move_prompt_substitutions() {
        let prompt = PromptTemplate::BetterMove {
            fen: "8/8/8/8/8/8/8/K6k w - - 0 1",
            played: "a1a2",
            candidate: "a1b1",
        }
        .render();
        assert!(prompt.starts_with("Chess position: 8/8/8/8/8/8/8/K6k w - - 0 1."));
        assert!(prompt.contains("The player moved a1a2, but a stronger move was a1b1."));
        assert!(prompt.contains("why a1b1 is a better choice"));
    }

    #[test]
    fn test_engine_rationale_prompt() {
        let prompt = PromptTemplate::EngineMoveRationale {
            fen: "startpos-fen",
            engine_move: "e7e5",
        }
        .render();
        assert_eq!(
            prompt,
            "Chess board position: startpos-fen. AI played e7e5. Why is this a strong move based on the position?"
        );
    }

    #[tokio::test]
    async fn test_explain_degrades_instead_of_failing() {
        let oracle = ScriptedOracle::failing_on("AI played");
        let template = PromptTemplate::EngineMoveRationale {
            fen: "f",
            engine_move: "e2e4",
        };
        let annotation = explain(&oracle, &template).await;
        assert!(annotation.is_degraded());
        assert_eq!(
            annotation.to_string(),
            "Error generating explanation: Generative API error: 503 Service Unavailable - overloaded"
        );
    }

    #[test]
    fn test_annotation_serializes_with_status() {
        let json = serde_json::to_value(Annotation::Text("Develops a knight.".into())).unwrap();
        assert_eq!(json["status"], "text");
        assert_eq!(json["text"], "Develops a knight.");
    }
}
