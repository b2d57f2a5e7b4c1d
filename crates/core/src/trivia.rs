//! Chess trivia for the intro screen

use rand::seq::IndexedRandom;
use regex::Regex;
use tracing::{info, warn};

use crate::oracle::{GenerationRequest, Oracle};

/// Models the fact request is spread across
pub const TRIVIA_MODELS: [&str; 6] = [
    "gemini-1.5-pro",
    "gemini-1.5-pro-002",
    "gemini-1.5-pro-latest",
    "gemini-1.5-flash",
    "gemini-1.5-flash-002",
    "gemini-1.5-flash-latest",
];

pub const TRIVIA_PROMPTS: [&str; 3] = [
    "Give 1 surprising chess fact in just 2 lines.",
    "Tell me two fun chess trivia facts in 2 lines.",
    "Share two little-known chess facts in 2 lines.",
];

const TRIVIA_TEMPERATURE: f32 = 0.9;

/// Builds a request with a random model and prompt
pub fn trivia_request() -> GenerationRequest {
    let mut rng = rand::rng();
    let model = TRIVIA_MODELS.choose(&mut rng).copied().unwrap_or(TRIVIA_MODELS[0]);
    let prompt = TRIVIA_PROMPTS.choose(&mut rng).copied().unwrap_or(TRIVIA_PROMPTS[0]);

    GenerationRequest::new(prompt)
        .model(model)
        .temperature(TRIVIA_TEMPERATURE)
}

/// Strips bold markers and list numbering or bullets from model output
pub fn clean_facts(text: &str) -> String {
    let text = text.trim();
    match Regex::new(r"(?m)\*\*|^\d+\.\s*|^[-*]\s*") {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Fetches a fact and formats it for display.
///
/// Failures are rendered as text; the intro screen never blocks the game.
pub async fn intro_fact<O: Oracle + ?Sized>(oracle: &O) -> String {
    let request = trivia_request();
    info!(model = request.model.as_deref().unwrap_or_default(), "fetching chess trivia");

    match oracle.generate(&request).await {
        Ok(text) => format!("Did you know?\n\n{}", clean_facts(&text)),
        Err(e) => {
            warn!(error = %e, "trivia request failed");
            format!("Error fetching facts: {}", e)
        }
    }
}
