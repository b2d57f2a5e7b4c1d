//! Configuration from environment variables

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::oracle::{GeminiClient, DEFAULT_MODEL, GEMINI_API_BASE};
use crate::style::StyleCategory;

pub const DEFAULT_ENGINE_PATH: &str = "/usr/local/bin/lc0";
pub const DEFAULT_WEIGHTS_OPTION: &str = "WeightsFile";

/// Engine settings used while playing a given style
#[derive(Clone, Debug, PartialEq)]
pub struct StyleProfile {
    /// Weights resource handed to the engine
    pub weights: String,
    /// Search time per engine move
    pub time_budget: Duration,
}

/// Static style -> engine configuration table
#[derive(Clone, Debug, PartialEq)]
pub struct EngineProfiles {
    pub aggressive: StyleProfile,
    pub balanced: StyleProfile,
    pub defensive: StyleProfile,
}

impl EngineProfiles {
    pub fn profile(&self, style: StyleCategory) -> &StyleProfile {
        match style {
            StyleCategory::Aggressive => &self.aggressive,
            StyleCategory::Balanced => &self.balanced,
            StyleCategory::Defensive => &self.defensive,
        }
    }
}

impl Default for EngineProfiles {
    fn default() -> Self {
        Self {
            // Deep and slow
            aggressive: StyleProfile {
                weights: "aggressive.pb".to_string(),
                time_budget: Duration::from_millis(2000),
            },
            balanced: StyleProfile {
                weights: "/opt/homebrew/Cellar/lc0/0.31.2/share/lc0/weights/42850".to_string(),
                time_budget: Duration::from_millis(500),
            },
            // Fast and shallow
            defensive: StyleProfile {
                weights: "defensive.pb".to_string(),
                time_budget: Duration::from_millis(100),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Path to the UCI engine binary
    pub engine_path: String,
    /// UCI option that selects the weights resource
    pub weights_option: String,
    pub profiles: EngineProfiles,
    /// Fixed search time for alternative-move analysis, whatever the style
    pub analysis_budget: Duration,
    /// Alternatives requested per player move
    pub analysis_lines: usize,
    /// Also ask the oracle why each engine move is good
    pub explain_engine_moves: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            engine_path: DEFAULT_ENGINE_PATH.to_string(),
            weights_option: DEFAULT_WEIGHTS_OPTION.to_string(),
            profiles: EngineProfiles::default(),
            analysis_budget: Duration::from_millis(1000),
            analysis_lines: 3,
            explain_engine_moves: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OracleConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl OracleConfig {
    pub fn client(&self) -> Result<GeminiClient> {
        Ok(GeminiClient::new(self.api_key.clone())?
            .with_model(self.model.clone())
            .with_base_url(self.base_url.clone()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub game: GameConfig,
    pub oracle: OracleConfig,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GameConfig::default();
        let string_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let profiles = EngineProfiles {
            aggressive: StyleProfile {
                weights: string_or("WEIGHTS_AGGRESSIVE", &defaults.profiles.aggressive.weights),
                ..defaults.profiles.aggressive.clone()
            },
            balanced: StyleProfile {
                weights: string_or("WEIGHTS_BALANCED", &defaults.profiles.balanced.weights),
                ..defaults.profiles.balanced.clone()
            },
            defensive: StyleProfile {
                weights: string_or("WEIGHTS_DEFENSIVE", &defaults.profiles.defensive.weights),
                ..defaults.profiles.defensive.clone()
            },
        };

        let analysis_budget = match lookup("ANALYSIS_TIME_MS") {
            Some(v) => Duration::from_millis(parse_var("ANALYSIS_TIME_MS", &v)?),
            None => defaults.analysis_budget,
        };

        let analysis_lines = match lookup("ANALYSIS_LINES") {
            Some(v) => parse_var("ANALYSIS_LINES", &v)?,
            None => defaults.analysis_lines,
        };

        let explain_engine_moves = match lookup("EXPLAIN_ENGINE_MOVES") {
            Some(v) => parse_flag("EXPLAIN_ENGINE_MOVES", &v)?,
            None => defaults.explain_engine_moves,
        };

        let game = GameConfig {
            engine_path: string_or("ENGINE_PATH", &defaults.engine_path),
            weights_option: string_or("ENGINE_WEIGHTS_OPTION", &defaults.weights_option),
            profiles,
            analysis_budget,
            analysis_lines,
            explain_engine_moves,
        };

        let oracle = OracleConfig {
            api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            model: string_or("GEMINI_MODEL", DEFAULT_MODEL),
            base_url: string_or("GEMINI_BASE_URL", GEMINI_API_BASE),
        };

        Ok(Self { game, oracle })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::Config(format!("{} must be true or false, got '{}'", key, value))),
    }
}
