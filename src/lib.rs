//! Baseball lineup optimization from Statcast data
//!
//! Trains a neural hit-probability model on pitch-by-pitch outcomes and
//! ranks a batting lineup against a given pitcher.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a player (MLBAM key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// Batting or throwing side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Handedness {
    #[default]
    Right,
    Left,
}

impl Handedness {
    /// Parse from the Statcast 'R'/'L' column. Anything unrecognized is
    /// treated as right-handed, matching the fallback assumption used
    /// everywhere else in the pipeline.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "L" | "l" => Handedness::Left,
            _ => Handedness::Right,
        }
    }

    /// Feature encoding used by the model: R=0.0, L=1.0
    pub fn as_feature(&self) -> f32 {
        match self {
            Handedness::Right => 0.0,
            Handedness::Left => 1.0,
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Right => write!(f, "R"),
            Handedness::Left => write!(f, "L"),
        }
    }
}

/// A single pitch-by-pitch record from the Statcast snapshot.
/// Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchEvent {
    pub pitcher: PlayerId,
    pub batter: PlayerId,
    /// Plate appearance outcome, empty for mid-at-bat pitches
    pub events: Option<String>,
    pub release_speed: Option<f32>,
    pub release_spin_rate: Option<f32>,
    pub p_throws: Handedness,
    pub stand: Handedness,
}

impl PitchEvent {
    /// Parsed outcome, if the row carries one
    pub fn outcome(&self) -> Option<EventOutcome> {
        self.events.as_deref().and_then(EventOutcome::parse)
    }
}

/// Plate appearance outcomes that matter for batting aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Single,
    Double,
    Triple,
    HomeRun,
    FieldOut,
    Strikeout,
    ForceOut,
    GroundedIntoDoublePlay,
    FieldersChoice,
}

impl EventOutcome {
    /// Parse a Statcast event string. Walks, sacrifices, hit-by-pitch and
    /// everything else return None: they are neither hits nor at-bats.
    pub fn parse(event: &str) -> Option<Self> {
        match event {
            "single" => Some(EventOutcome::Single),
            "double" => Some(EventOutcome::Double),
            "triple" => Some(EventOutcome::Triple),
            "home_run" => Some(EventOutcome::HomeRun),
            "field_out" => Some(EventOutcome::FieldOut),
            "strikeout" => Some(EventOutcome::Strikeout),
            "force_out" => Some(EventOutcome::ForceOut),
            "grounded_into_double_play" => Some(EventOutcome::GroundedIntoDoublePlay),
            "fielders_choice" => Some(EventOutcome::FieldersChoice),
            _ => None,
        }
    }

    /// Whether the outcome is a base hit
    pub fn is_hit(&self) -> bool {
        matches!(
            self,
            EventOutcome::Single
                | EventOutcome::Double
                | EventOutcome::Triple
                | EventOutcome::HomeRun
        )
    }

    /// Bases credited for slugging (0 for outs)
    pub fn total_bases(&self) -> u32 {
        match self {
            EventOutcome::Single => 1,
            EventOutcome::Double => 2,
            EventOutcome::Triple => 3,
            EventOutcome::HomeRun => 4,
            _ => 0,
        }
    }
}

/// Derived batting aggregates for one batter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterProfile {
    pub stand: Handedness,
    pub at_bats: u32,
    pub hits: u32,
    pub total_bases: u32,
    /// Batting average: hits / at-bats
    pub avg: f32,
    /// Slugging: total bases / at-bats
    pub slg: f32,
    /// Isolated power: slg - avg
    pub iso: f32,
}

/// Derived pitching aggregates for one pitcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitcherProfile {
    /// Mean pitch velocity (mph)
    pub release_speed: f32,
    /// Mean spin rate (rpm)
    pub release_spin_rate: f32,
    /// Taken from the first observed record, not the mode
    pub throws: Handedness,
}

/// One ranked entry of the optimized lineup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupPrediction {
    pub batter: String,
    /// Predicted probability of a hit, in [0, 1]
    pub hit_probability: f32,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum LineupError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model or scaler not found - run `lineup train` first")]
    MissingArtifacts,

    #[error("No valid batters found")]
    NoValidBatters,

    #[error("No historical data at {0} - run `lineup data fetch` first")]
    NoData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, LineupError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub fallback: FallbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Statcast snapshot (flat CSV, one row per pitch)
    pub statcast_cache: String,
    /// Chadwick people register cache
    pub register_cache: String,
    /// Derived per-batter aggregates, re-derivable from the snapshot
    pub batter_stats_path: String,
    /// Model weights path (burn appends .mpk)
    pub model_path: String,
    /// Standardization statistics, stored alongside the model
    pub scaler_path: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub hidden_dims: Vec<usize>,
    pub dropout: f64,
    /// Fraction of samples held out for evaluation
    pub test_fraction: f64,
    pub early_stopping_patience: usize,
    pub seed: u64,
}

/// Defaults used when a batter cannot be resolved. Injected into the
/// profile store so tests can override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub batter_avg: f32,
    pub batter_slg: f32,
    pub batter_iso: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                statcast_cache: "data/statcast_2024.csv".to_string(),
                register_cache: "data/people_register.csv".to_string(),
                batter_stats_path: "data/batter_stats.csv".to_string(),
                model_path: "model/hitnet".to_string(),
                scaler_path: "model/scaler.json".to_string(),
                start_date: "2024-04-01".to_string(),
                end_date: "2024-07-01".to_string(),
            },
            training: TrainingConfig {
                epochs: 200,
                learning_rate: 0.1,
                hidden_dims: vec![128, 64, 32],
                dropout: 0.2,
                test_fraction: 0.2,
                early_stopping_patience: 20,
                seed: 42,
            },
            fallback: FallbackConfig {
                batter_avg: 0.240,
                batter_slg: 0.400,
                batter_iso: 0.160,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LineupError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| LineupError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LineupError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_outcome_parse() {
        assert_eq!(EventOutcome::parse("single"), Some(EventOutcome::Single));
        assert_eq!(EventOutcome::parse("home_run"), Some(EventOutcome::HomeRun));
        assert_eq!(
            EventOutcome::parse("strikeout"),
            Some(EventOutcome::Strikeout)
        );
        // Walks and sacrifices are excluded by design
        assert_eq!(EventOutcome::parse("walk"), None);
        assert_eq!(EventOutcome::parse("sac_fly"), None);
        assert_eq!(EventOutcome::parse("hit_by_pitch"), None);
    }

    #[test]
    fn test_total_bases() {
        assert_eq!(EventOutcome::Single.total_bases(), 1);
        assert_eq!(EventOutcome::Double.total_bases(), 2);
        assert_eq!(EventOutcome::Triple.total_bases(), 3);
        assert_eq!(EventOutcome::HomeRun.total_bases(), 4);
        assert_eq!(EventOutcome::Strikeout.total_bases(), 0);
    }

    #[test]
    fn test_handedness_encoding() {
        assert_eq!(Handedness::from_code("R").as_feature(), 0.0);
        assert_eq!(Handedness::from_code("L").as_feature(), 1.0);
        // Unrecognized codes assume right-handed
        assert_eq!(Handedness::from_code(""), Handedness::Right);
        assert_eq!(Handedness::from_code("S"), Handedness::Right);
    }

    #[test]
    fn test_default_fallback_constants() {
        let config = Config::default();
        assert_eq!(config.fallback.batter_avg, 0.240);
        assert_eq!(config.fallback.batter_slg, 0.400);
        assert_eq!(config.fallback.batter_iso, 0.160);
    }
}
