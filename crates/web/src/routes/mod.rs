use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use adaptive_chess_core::trivia;

use crate::AppState;

pub mod game;

#[derive(Serialize)]
pub struct IntroResponse {
    pub text: String,
}

/// Welcome-screen trivia; failures come back as display text, never as an error status
pub async fn intro(State(state): State<Arc<AppState>>) -> Json<IntroResponse> {
    let text = trivia::intro_fact(&state.oracle).await;
    Json(IntroResponse { text })
}

pub async fn health() -> &'static str {
    "OK"
}
