//! Game progression: one human against the adaptive engine
//!
//! A `Game` owns the position, the move record and the engine session. It
//! handles one player move at a time: apply it, collect alternatives with
//! commentary, lock the engine's style after the third move, then ask the
//! engine for its reply.

mod outcome;
mod phase;

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, Color, Position};
use thiserror::Error;
use tracing::{error, info, warn};

pub use outcome::{GameResult, Termination};
pub use phase::{GameEnd, Phase};

use crate::config::GameConfig;
use crate::engine::{Engine, EngineError};
use crate::feedback::{format_suggestions, serialize_uci, suggest_alternatives, FeedbackEntry};
use crate::oracle::{explain, Annotation, Oracle, PromptTemplate};
use crate::style::{classify, StyleCategory, OPENING_MOVES};
use crate::{analyze_position, color_name, fen, PositionInfo};

#[derive(Error, Debug)]
pub enum GameError {
    #[error("'{0}' is not a move in UCI notation")]
    InvalidNotation(String),

    #[error("{0} is not a legal move in this position")]
    IllegalMove(String),

    #[error("It is not your turn")]
    NotYourTurn,

    #[error("The game is over")]
    Finished,

    #[error("Engine played an illegal move {mv} in {fen}")]
    EngineDefect { mv: String, fen: String },

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),
}

impl GameError {
    /// Fatal errors end the game; the others leave it as it was
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GameError::EngineDefect { .. } | GameError::EngineUnavailable(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mover {
    Human,
    Engine,
}

/// One entry of the game record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedMove {
    pub by: Mover,
    #[serde(rename = "move", serialize_with = "serialize_uci")]
    pub mv: UciMove,
}

/// The style lock that happened on this engine turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleChange {
    pub style: StyleCategory,
    /// False when the engine refused the new weights and kept the old ones
    pub reconfigured: bool,
}

/// What the engine did on its turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineTurn {
    #[serde(rename = "move", serialize_with = "serialize_uci")]
    pub mv: UciMove,
    /// Style the engine played this move with
    pub playing_as: StyleCategory,
    pub budget_ms: u64,
    pub style_change: Option<StyleChange>,
    /// Only filled when engine-move commentary is enabled
    pub rationale: Option<Annotation>,
}

/// Everything that happened in response to one player move
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    #[serde(serialize_with = "serialize_uci")]
    pub human_move: UciMove,
    pub feedback: Vec<FeedbackEntry>,
    pub suggestion_text: String,
    pub engine: Option<EngineTurn>,
    pub outcome: Option<GameEnd>,
}

/// Read-only view for the display layer
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub position: PositionInfo,
    pub human_color: &'static str,
    pub phase: Phase,
    pub style: Option<StyleCategory>,
    /// Player moves counted towards style selection, capped at three
    pub opening_moves_recorded: usize,
    pub record: Vec<RecordedMove>,
    #[serde(serialize_with = "serialize_opt_uci")]
    pub last_engine_move: Option<UciMove>,
    pub last_feedback: Vec<FeedbackEntry>,
}

fn serialize_opt_uci<S: serde::Serializer>(
    mv: &Option<UciMove>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match mv {
        Some(mv) => serializer.collect_str(mv),
        None => serializer.serialize_none(),
    }
}

pub struct Game<E: Engine, O: Oracle> {
    engine: E,
    engine_released: bool,
    oracle: O,
    config: GameConfig,
    human: Color,
    position: Chess,
    phase: Phase,
    record: Vec<RecordedMove>,
    human_moves: Vec<UciMove>,
    repetitions: HashMap<String, u32>,
    last_engine_move: Option<UciMove>,
    last_feedback: Vec<FeedbackEntry>,
}

impl<E: Engine, O: Oracle> Game<E, O> {
    /// Starts a game from the initial position.
    ///
    /// When the player takes Black the engine opens immediately with the
    /// balanced budget.
    pub async fn start(engine: E, oracle: O, config: GameConfig, human: Color) -> Result<Self, GameError> {
        let position = Chess::default();
        let mut repetitions = HashMap::new();
        repetitions.insert(outcome::repetition_key(&position), 1);

        let mut game = Self {
            engine,
            engine_released: false,
            oracle,
            config,
            human,
            position,
            phase: Phase::UnstyledWarmup,
            record: Vec::new(),
            human_moves: Vec::new(),
            repetitions,
            last_engine_move: None,
            last_feedback: Vec::new(),
        };

        info!(human = color_name(human), "game started");

        if game.position.turn() != human {
            game.engine_turn().await?;
        }

        Ok(game)
    }

    /// Handles one player move end to end.
    ///
    /// Notation errors, illegal moves and out-of-turn moves leave the game
    /// untouched. Engine failures are fatal: the game is over and the engine
    /// released before the error is returned.
    pub async fn play_human_move(&mut self, input: &str) -> Result<TurnReport, GameError> {
        if self.phase.is_over() {
            return Err(GameError::Finished);
        }
        if self.position.turn() != self.human {
            return Err(GameError::NotYourTurn);
        }

        let input = input.trim();
        let uci: UciMove = input
            .parse()
            .map_err(|_| GameError::InvalidNotation(input.to_string()))?;
        let mv = uci
            .to_move(&self.position)
            .map_err(|_| GameError::IllegalMove(input.to_string()))?;

        let before = self.position.clone();
        self.apply(mv, uci.clone(), Mover::Human)
            .map_err(|_| GameError::IllegalMove(input.to_string()))?;
        self.human_moves.push(uci.clone());

        let feedback = match suggest_alternatives(
            &mut self.engine,
            &self.oracle,
            &before,
            &uci,
            self.config.analysis_lines,
            self.config.analysis_budget,
        )
        .await
        {
            Ok(entries) => entries,
            Err(e) => return Err(self.abort(GameError::EngineUnavailable(e)).await),
        };
        let suggestion_text = format_suggestions(&uci, &feedback);
        self.last_feedback = feedback.clone();

        self.phase = self.phase.after_human_move(self.human_moves.len());

        let mut report = TurnReport {
            human_move: uci,
            feedback,
            suggestion_text,
            engine: None,
            outcome: None,
        };

        if let Some(end) = self.check_game_over().await {
            report.outcome = Some(end);
            return Ok(report);
        }

        report.engine = Some(self.engine_turn().await?);
        report.outcome = self.check_game_over().await;

        Ok(report)
    }

    /// Search time for the engine's next move
    fn budget(&self) -> Duration {
        let style = self.phase.style().unwrap_or(StyleCategory::Balanced);
        self.config.profiles.profile(style).time_budget
    }

    /// Classifies the opening, locks the style and swaps the engine's weights
    async fn lock_style(&mut self) -> Option<StyleChange> {
        let style = self.phase.lock(classify(&self.human_moves))?;
        info!(style = style.as_str(), "engine style locked");

        let weights = self.config.profiles.profile(style).weights.clone();
        let option = self.config.weights_option.clone();
        let reconfigured = match self.engine.configure(&[(option.as_str(), weights.as_str())]).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, weights = weights.as_str(), "could not switch engine weights; keeping previous configuration");
                false
            }
        };

        Some(StyleChange { style, reconfigured })
    }

    /// Asks the engine for its move and plays it
    async fn engine_turn(&mut self) -> Result<EngineTurn, GameError> {
        let style_change = if self.phase == Phase::StyleLocking {
            self.lock_style().await
        } else {
            None
        };

        let playing_as = self.phase.style().unwrap_or(StyleCategory::Balanced);
        let budget = self.budget();
        let fen = fen(&self.position);

        let uci = match self.engine.best_move(&fen, budget).await {
            Ok(uci) => uci,
            Err(e) => return Err(self.abort(GameError::EngineUnavailable(e)).await),
        };

        let applied = uci
            .to_move(&self.position)
            .ok()
            .map(|mv| self.apply(mv, uci.clone(), Mover::Engine));
        if !matches!(applied, Some(Ok(()))) {
            let defect = GameError::EngineDefect {
                mv: uci.to_string(),
                fen,
            };
            return Err(self.abort(defect).await);
        }

        info!(mv = %uci, style = playing_as.as_str(), budget_ms = budget.as_millis() as u64, "engine moved");
        self.last_engine_move = Some(uci.clone());

        let rationale = if self.config.explain_engine_moves {
            let engine_move = uci.to_string();
            Some(
                explain(
                    &self.oracle,
                    &PromptTemplate::EngineMoveRationale {
                        fen: &fen,
                        engine_move: &engine_move,
                    },
                )
                .await,
            )
        } else {
            None
        };

        Ok(EngineTurn {
            mv: uci,
            playing_as,
            budget_ms: budget.as_millis() as u64,
            style_change,
            rationale,
        })
    }

    /// Plays a move already checked for legality and records it
    fn apply(&mut self, mv: shakmaty::Move, uci: UciMove, by: Mover) -> Result<(), GameError> {
        self.position = self
            .position
            .clone()
            .play(mv)
            .map_err(|_| GameError::IllegalMove(uci.to_string()))?;
        *self
            .repetitions
            .entry(outcome::repetition_key(&self.position))
            .or_insert(0) += 1;
        self.record.push(RecordedMove { by, mv: uci });
        Ok(())
    }

    /// Ends the game if the position is terminal
    async fn check_game_over(&mut self) -> Option<GameEnd> {
        let occurrences = self
            .repetitions
            .get(&outcome::repetition_key(&self.position))
            .copied()
            .unwrap_or(1);
        let result = outcome::detect(&self.position, occurrences)?;
        let end = GameEnd::Finished(result);
        info!(result = end.result(), "game over");
        self.finish(end.clone()).await;
        Some(end)
    }

    async fn finish(&mut self, end: GameEnd) {
        self.phase = Phase::GameOver(end);
        self.release_engine().await;
    }

    /// Records a fatal error as the end of the game and hands it back
    async fn abort(&mut self, err: GameError) -> GameError {
        error!(error = %err, "aborting game");
        self.finish(GameEnd::Aborted {
            reason: err.to_string(),
        })
        .await;
        err
    }

    async fn release_engine(&mut self) {
        if !self.engine_released {
            self.engine.quit().await;
            self.engine_released = true;
        }
    }

    /// Releases the engine; the game cannot continue afterwards
    pub async fn close(mut self) {
        self.release_engine().await;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            position: analyze_position(&self.position),
            human_color: color_name(self.human),
            phase: self.phase.clone(),
            style: self.phase.style(),
            opening_moves_recorded: self.human_moves.len().min(OPENING_MOVES),
            record: self.record.clone(),
            last_engine_move: self.last_engine_move.clone(),
            last_feedback: self.last_feedback.clone(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn style(&self) -> Option<StyleCategory> {
        self.phase.style()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn record(&self) -> &[RecordedMove] {
        &self.record
    }

    pub fn human_color(&self) -> Color {
        self.human
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn is_engine_released(&self) -> bool {
        self.engine_released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedEngine;
    use crate::oracle::testing::ScriptedOracle;

    fn config() -> GameConfig {
        GameConfig::default()
    }

    async fn white_game(engine: ScriptedEngine) -> Game<ScriptedEngine, ScriptedOracle> {
        Game::start(engine, ScriptedOracle::new(), config(), Color::White)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_move_stays_in_warmup() {
        let mut game = white_game(ScriptedEngine::new().with_reply("e7e5")).await;

        let report = game.play_human_move("e2e4").await.unwrap();

        assert_eq!(game.phase(), &Phase::UnstyledWarmup);
        assert_eq!(game.style(), None);
        let engine = report.engine.unwrap();
        assert_eq!(engine.mv.to_string(), "e7e5");
        assert_eq!(engine.playing_as, StyleCategory::Balanced);
        assert_eq!(engine.budget_ms, 500);
        assert!(engine.style_change.is_none());
        assert!(game.engine().configured.is_empty());
        assert_eq!(report.feedback.len(), 3);
        assert_eq!(game.record().len(), 2);
    }

    #[tokio::test]
    async fn test_aggressive_opening_locks_style_on_third_move() {
        let engine = ScriptedEngine::new()
            .with_reply("e7e5")
            .with_reply("b8c6")
            .with_reply("g8f6");
        let mut game = white_game(engine).await;

        game.play_human_move("e2e4").await.unwrap();
        game.play_human_move("d2d4").await.unwrap();
        assert_eq!(game.phase(), &Phase::UnstyledWarmup);

        let report = game.play_human_move("g1f3").await.unwrap();
        let engine_turn = report.engine.unwrap();
        assert_eq!(
            engine_turn.style_change,
            Some(StyleChange {
                style: StyleCategory::Aggressive,
                reconfigured: true,
            })
        );
        assert_eq!(engine_turn.playing_as, StyleCategory::Aggressive);
        assert_eq!(engine_turn.budget_ms, 2000);
        assert_eq!(game.phase(), &Phase::Styled(StyleCategory::Aggressive));
        assert_eq!(
            game.engine().configured,
            vec![("WeightsFile".to_string(), "aggressive.pb".to_string())]
        );
        assert_eq!(
            game.engine().search_budgets,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(500),
                Duration::from_millis(2000),
            ]
        );
    }

    #[tokio::test]
    async fn test_style_stays_locked_for_the_rest_of_the_game() {
        let engine = ScriptedEngine::new()
            .with_reply("e7e5")
            .with_reply("d7d5")
            .with_reply("g8f6")
            .with_reply("b8c6")
            .with_reply("f8e7");
        let mut game = white_game(engine).await;

        for mv in ["e2e3", "g2g3", "b1c3"] {
            game.play_human_move(mv).await.unwrap();
        }
        assert_eq!(game.style(), Some(StyleCategory::Defensive));

        // Central advances from here on change nothing
        game.play_human_move("d2d4").await.unwrap();
        let report = game.play_human_move("f1g2").await.unwrap();
        assert_eq!(game.style(), Some(StyleCategory::Defensive));
        assert!(report.engine.unwrap().style_change.is_none());
        assert_eq!(game.engine().configured.len(), 1);
        assert_eq!(
            game.engine().search_budgets.last(),
            Some(&Duration::from_millis(100))
        );
    }

    #[tokio::test]
    async fn test_failed_reconfigure_keeps_playing() {
        let mut engine = ScriptedEngine::new()
            .with_reply("e7e5")
            .with_reply("b8c6")
            .with_reply("g8f6");
        engine.reject_configure = true;
        let mut game = white_game(engine).await;

        game.play_human_move("e2e4").await.unwrap();
        game.play_human_move("d2d4").await.unwrap();
        let report = game.play_human_move("c2c4").await.unwrap();

        let engine_turn = report.engine.unwrap();
        assert_eq!(
            engine_turn.style_change,
            Some(StyleChange {
                style: StyleCategory::Aggressive,
                reconfigured: false,
            })
        );
        assert_eq!(game.style(), Some(StyleCategory::Aggressive));
        assert!(!game.phase().is_over());
    }

    #[tokio::test]
    async fn test_illegal_human_move_is_rejected_without_side_effects() {
        let mut game = white_game(ScriptedEngine::new()).await;

        let err = game.play_human_move("e2e5").await.unwrap_err();
        assert!(matches!(err, GameError::IllegalMove(_)));
        assert!(!err.is_fatal());

        let err = game.play_human_move("castle").await.unwrap_err();
        assert!(matches!(err, GameError::InvalidNotation(_)));

        assert!(game.record().is_empty());
        assert!(game.engine().analysis_calls.is_empty());
        assert_eq!(game.phase(), &Phase::UnstyledWarmup);
    }

    #[tokio::test]
    async fn test_illegal_engine_move_aborts_the_game() {
        let mut game = white_game(ScriptedEngine::new().with_reply("e8e1")).await;

        let err = game.play_human_move("e2e4").await.unwrap_err();
        assert!(matches!(err, GameError::EngineDefect { .. }));
        assert!(err.is_fatal());
        assert!(matches!(game.phase(), Phase::GameOver(GameEnd::Aborted { .. })));
        assert!(game.is_engine_released());
        assert_eq!(game.engine().quit_calls, 1);

        assert!(matches!(
            game.play_human_move("d2d4").await,
            Err(GameError::Finished)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_fatal() {
        let mut engine = ScriptedEngine::new();
        engine.fail_best_move = true;
        let mut game = white_game(engine).await;

        let err = game.play_human_move("e2e4").await.unwrap_err();
        assert!(matches!(err, GameError::EngineUnavailable(EngineError::Closed)));
        assert!(game.phase().is_over());
        assert_eq!(game.engine().quit_calls, 1);
    }

    #[tokio::test]
    async fn test_engine_opens_when_human_is_black() {
        let game = Game::start(
            ScriptedEngine::new().with_reply("d2d4"),
            ScriptedOracle::new(),
            config(),
            Color::Black,
        )
        .await
        .unwrap();

        assert_eq!(game.record().len(), 1);
        assert_eq!(game.record()[0].by, Mover::Engine);
        assert_eq!(game.position().turn(), Color::Black);
        assert_eq!(
            game.engine().search_budgets,
            vec![Duration::from_millis(500)]
        );
    }

    #[tokio::test]
    async fn test_engine_failure_on_opening_move_fails_start() {
        let mut engine = ScriptedEngine::new();
        engine.fail_best_move = true;
        let result = Game::start(engine, ScriptedOracle::new(), config(), Color::Black).await;
        assert!(matches!(result, Err(GameError::EngineUnavailable(_))));
    }

    #[tokio::test]
    async fn test_checkmate_by_human_ends_game_before_engine_reply() {
        // 1.e4 f6 2.d4 g5 3.Qh5#
        let engine = ScriptedEngine::new().with_reply("f7f6").with_reply("g7g5");
        let mut game = white_game(engine).await;

        game.play_human_move("e2e4").await.unwrap();
        game.play_human_move("d2d4").await.unwrap();
        let report = game.play_human_move("d1h5").await.unwrap();

        assert!(report.engine.is_none());
        let outcome = report.outcome.unwrap();
        assert_eq!(outcome.result(), "1-0");
        assert!(game.is_engine_released());
        assert_eq!(game.engine().search_budgets.len(), 2);
        assert!(game.engine().configured.is_empty());
        assert!(matches!(
            game.play_human_move("a2a3").await,
            Err(GameError::Finished)
        ));
    }

    #[tokio::test]
    async fn test_feedback_failure_isolated_per_entry() {
        let engine = ScriptedEngine::new().with_candidates(&["d2d4", "g1f3", "c2c4"]);
        let oracle = ScriptedOracle::failing_on("stronger move was g1f3");
        let mut game = Game::start(engine, oracle, config(), Color::White)
            .await
            .unwrap();

        let report = game.play_human_move("a2a3").await.unwrap();

        assert_eq!(report.feedback.len(), 3);
        let degraded: Vec<bool> = report
            .feedback
            .iter()
            .map(|e| e.explanation.is_degraded())
            .collect();
        assert_eq!(degraded, vec![false, true, false]);
        assert!(report.suggestion_text.starts_with("Instead of a2a3, consider:\n"));
        assert!(report.engine.is_some());
    }

    #[tokio::test]
    async fn test_engine_rationale_when_enabled() {
        let mut config = config();
        config.explain_engine_moves = true;
        let mut game = Game::start(ScriptedEngine::new(), ScriptedOracle::new(), config, Color::White)
            .await
            .unwrap();

        let report = game.play_human_move("e2e4").await.unwrap();
        let rationale = report.engine.unwrap().rationale.unwrap();
        assert!(!rationale.is_degraded());
    }

    #[tokio::test]
    async fn test_snapshot_and_close() {
        let mut game = white_game(ScriptedEngine::new().with_reply("e7e5")).await;
        game.play_human_move("e2e4").await.unwrap();

        let snapshot = game.snapshot();
        assert_eq!(snapshot.human_color, "white");
        assert_eq!(snapshot.opening_moves_recorded, 1);
        assert_eq!(snapshot.position.side_to_move, "white");
        assert_eq!(snapshot.last_feedback.len(), 3);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["last_engine_move"], "e7e5");
        assert_eq!(json["record"][0]["move"], "e2e4");
        assert_eq!(json["record"][1]["by"], "engine");
        assert_eq!(json["phase"]["state"], "unstyled_warmup");

        game.close().await;
    }
}
