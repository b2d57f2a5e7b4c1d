//! Quick check that the configured engine speaks UCI and can search

use adaptive_chess_core::engine::{Engine, UciEngine};
use adaptive_chess_core::{fen, starting_position, trivia, Config, StyleCategory};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.game.engine_path.clone());

    println!("Starting engine: {}", path);

    let mut engine = match UciEngine::new(&path).await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to start engine: {}", e);
            std::process::exit(1);
        }
    };
    println!("Engine: {}", engine.name().unwrap_or("unknown"));

    let start = fen(&starting_position());
    let budget = config.game.profiles.profile(StyleCategory::Balanced).time_budget;

    match engine.best_move(&start, budget).await {
        Ok(mv) => println!("Best move from the start ({} ms): {}", budget.as_millis(), mv),
        Err(e) => {
            eprintln!("Search failed: {}", e);
            std::process::exit(1);
        }
    }

    println!("\nTop {} lines:\n", config.game.analysis_lines);
    match engine
        .analyze_top_n(&start, config.game.analysis_lines, config.game.analysis_budget)
        .await
    {
        Ok(candidates) => {
            for candidate in &candidates {
                println!("  {}", candidate.summary());
            }
        }
        Err(e) => eprintln!("Analysis failed: {}", e),
    }

    println!("\nStyle weights:");
    for style in StyleCategory::ALL {
        let weights = &config.game.profiles.profile(style).weights;
        match engine
            .configure(&[(config.game.weights_option.as_str(), weights.as_str())])
            .await
        {
            Ok(()) => println!("  {:<10} {} ok", style.as_str(), weights),
            Err(e) => println!("  {:<10} {} rejected: {}", style.as_str(), weights, e),
        }
    }

    engine.quit().await;

    match config.oracle.client() {
        Ok(client) => println!("\n{}", trivia::intro_fact(&client).await),
        Err(e) => eprintln!("Oracle client unavailable: {}", e),
    }
}
