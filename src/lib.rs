//! Cricket match winner prediction
//!
//! Encodes pre-match categorical and date features with a persisted encoder
//! registry, trains a random forest over them and decodes its predictions back
//! to team names.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod report;
pub mod training;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decision taken by the toss winner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Field,
}

impl TossDecision {
    /// Fixed numeric code used as a model feature
    pub fn code(&self) -> u32 {
        match self {
            TossDecision::Bat => 0,
            TossDecision::Field => 1,
        }
    }
}

impl FromStr for TossDecision {
    type Err = CricketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bat" => Ok(TossDecision::Bat),
            "field" => Ok(TossDecision::Field),
            _ => Err(CricketError::InvalidTossDecision(s.to_string())),
        }
    }
}

impl fmt::Display for TossDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TossDecision::Bat => write!(f, "bat"),
            TossDecision::Field => write!(f, "field"),
        }
    }
}

/// A single historical match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub team1: String,
    pub team2: String,
    pub toss_winner: Option<String>,
    pub toss_decision: Option<TossDecision>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub date: Option<NaiveDate>,
    pub season: Option<i32>,
    /// Absent for abandoned matches or records without a result
    pub winner: Option<String>,
}

/// Match description supplied at prediction time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub team1: String,
    pub team2: String,
    pub toss_winner: String,
    pub toss_decision: TossDecision,
    pub venue: String,
    pub date: Option<NaiveDate>,
    pub city: Option<String>,
    pub season: Option<i32>,
}

impl PredictionRequest {
    pub fn new(
        team1: impl Into<String>,
        team2: impl Into<String>,
        toss_winner: impl Into<String>,
        toss_decision: TossDecision,
        venue: impl Into<String>,
    ) -> Self {
        PredictionRequest {
            team1: team1.into(),
            team2: team2.into(),
            toss_winner: toss_winner.into(),
            toss_decision,
            venue: venue.into(),
            date: None,
            city: None,
            season: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_season(mut self, season: i32) -> Self {
        self.season = Some(season);
        self
    }
}

/// Model prediction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub team1: String,
    pub team2: String,
    pub winner: String,
    pub winner_code: u32,
    /// Request fields that were filled from training-time defaults
    pub defaulted: Vec<String>,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum CricketError {
    #[error("No values to encode for domain '{domain}'")]
    EmptyDomain { domain: String },

    #[error("Unknown {domain}: '{value}' was not seen during training")]
    UnknownCategory { domain: String, value: String },

    #[error("Invalid code {code} for domain '{domain}' of size {size}")]
    InvalidCode {
        domain: String,
        code: u32,
        size: usize,
    },

    #[error("Toss winner '{toss_winner}' must be either '{team1}' or '{team2}'")]
    InvalidTossWinner {
        toss_winner: String,
        team1: String,
        team2: String,
    },

    #[error("Invalid toss decision '{0}': expected 'bat' or 'field'")]
    InvalidTossDecision(String),

    #[error("Missing required feature: {0}")]
    MissingFeature(&'static str),

    #[error("No usable training rows ({dropped} of {total} records dropped)")]
    EmptyTrainingSet { total: usize, dropped: usize },

    #[error("Training target has a single class ('{class}'); need at least two winners")]
    SingleClassTarget { class: String },

    #[error("Feature mismatch: expected {expected} columns, got {found}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("Artifact is inconsistent: {0}")]
    ArtifactMismatch(String),

    #[error("Evaluation sample is empty")]
    EmptySample,

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Model not trained - run `cricket train` first")]
    NoModel,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CricketError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub training: TrainingConfig,
    pub report: ReportConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub n_trees: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    /// Fraction of usable rows held out for evaluation (0 disables)
    pub holdout_fraction: f64,
    /// Refit the saved model on every usable row after holdout evaluation
    #[serde(default = "default_refit")]
    pub refit_on_full_data: bool,
}

fn default_refit() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum rows sampled for feature importance
    pub sample_size: usize,
    /// Shuffles per feature when measuring importance
    pub n_repeats: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub matches_path: String,
    pub model_path: String,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
            holdout_fraction: 0.2,
            refit_on_full_data: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            sample_size: 100,
            n_repeats: 5,
            seed: 42,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            training: TrainingConfig::default(),
            report: ReportConfig::default(),
            data: DataConfig {
                matches_path: "data/ipl_match_info_data.csv".to_string(),
                model_path: "model/cricket_model.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CricketError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CricketError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CricketError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.training.n_trees == 0 {
            return Err(CricketError::Config("training.n_trees must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.training.holdout_fraction) {
            return Err(CricketError::Config(format!(
                "training.holdout_fraction must be in [0, 1), got {}",
                self.training.holdout_fraction
            )));
        }
        if self.report.n_repeats == 0 {
            return Err(CricketError::Config("report.n_repeats must be positive".into()));
        }
        Ok(())
    }
}
