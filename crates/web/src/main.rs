use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use adaptive_chess_core::{Config, Game, GeminiClient, UciEngine};

mod error;
mod routes;

pub struct AppState {
    pub config: Config,
    pub oracle: GeminiClient,
    /// The single game in progress, if any
    pub game: Mutex<Option<Game<UciEngine, GeminiClient>>>,
}

impl AppState {
    pub fn new(config: Config) -> adaptive_chess_core::Result<Self> {
        let oracle = config.oracle.client()?;
        Ok(Self {
            config,
            oracle,
            game: Mutex::new(None),
        })
    }
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/intro", get(routes::intro))
        .route(
            "/api/game",
            get(routes::game::current_game)
                .post(routes::game::new_game)
                .delete(routes::game::end_game),
        )
        .route("/api/game/move", post(routes::game::play_move))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().expect("Invalid configuration");
    if config.oracle.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set - move explanations will be unavailable");
    }
    tracing::info!("Engine: {}", config.game.engine_path);

    let state = Arc::new(AppState::new(config).expect("Failed to create oracle client"));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("Server running at http://{}", addr);

    axum::serve(listener, app(state)).await.expect("Server error");
}
