use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use adaptive_chess_core::{Color, Game, GameSnapshot, TurnReport, UciEngine};

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewGameRequest {
    #[serde(default)]
    pub side: Side,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// Move in UCI notation, e.g. `e2e4` or `e7e8q`
    pub uci: String,
}

#[derive(Serialize)]
pub struct MoveResponse {
    pub report: TurnReport,
    pub game: GameSnapshot,
}

fn no_game() -> AppError {
    AppError::NotFound("No game in progress".to_string())
}

/// Starts a new game, replacing any game in progress
pub async fn new_game(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewGameRequest>,
) -> Result<(StatusCode, Json<GameSnapshot>), AppError> {
    let mut slot = state.game.lock().await;
    if let Some(previous) = slot.take() {
        tracing::info!("Replacing game in progress");
        previous.close().await;
    }

    let engine = UciEngine::new(&state.config.game.engine_path).await?;
    let game = Game::start(
        engine,
        state.oracle.clone(),
        state.config.game.clone(),
        request.side.into(),
    )
    .await?;

    let snapshot = game.snapshot();
    *slot = Some(game);
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn current_game(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GameSnapshot>, AppError> {
    let slot = state.game.lock().await;
    let game = slot.as_ref().ok_or_else(no_game)?;
    Ok(Json(game.snapshot()))
}

/// Plays the player's move and the engine's reply.
///
/// A fatal engine failure ends the game but keeps it around so the final
/// state can still be fetched.
pub async fn play_move(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    let mut slot = state.game.lock().await;
    let game = slot.as_mut().ok_or_else(no_game)?;

    let report = game.play_human_move(&request.uci).await?;
    Ok(Json(MoveResponse {
        report,
        game: game.snapshot(),
    }))
}

pub async fn end_game(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    let game = state.game.lock().await.take().ok_or_else(no_game)?;
    game.close().await;
    Ok(StatusCode::NO_CONTENT)
}
