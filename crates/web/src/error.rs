use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use adaptive_chess_core::engine::EngineError;
use adaptive_chess_core::GameError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Engine unavailable: {0}")]
    Engine(#[from] EngineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Game(GameError::InvalidNotation(_) | GameError::IllegalMove(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Game(GameError::NotYourTurn | GameError::Finished) => StatusCode::CONFLICT,
            AppError::Game(e) => {
                tracing::error!("Game aborted: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Engine(e) => {
                tracing::error!("Engine error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
