//! Sentiment tracking for the support portal
//!
//! This module holds the sentiment value types shared by the session store,
//! the simulator and the HTTP layer:
//!
//! - `scenario`: fixed weighted tables the generator samples from
//! - `generator`: weighted sampling with noise and service-level draws
//! - `aggregate`: trailing-window average and trend classification
//! - `simulator`: timer-driven stream of generated values
//! - `analysis`: keyword heuristics, canned replies and demo statistics

pub mod aggregate;
pub mod analysis;
pub mod generator;
pub mod scenario;
pub mod simulator;

use crate::error::HelpdeskError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use aggregate::{calculate_aggregate, calculate_aggregate_at, AggregateSentiment, Trend};
pub use generator::{generate_batch, generate_sentiment, sample_service_level};
pub use scenario::{Scenario, ScenarioEntry};
pub use simulator::SentimentSimulator;

/// Score assigned when nothing has been observed yet
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Coarse support tier
///
/// Only biases prompt text and simulated distributions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLevel {
    /// Default tier
    #[default]
    Basic,
    /// Paid tier with more detailed answers
    Premium,
    /// Top tier
    Enterprise,
}

impl ServiceLevel {
    /// All tiers, cheapest first
    pub const ALL: [ServiceLevel; 3] = [
        ServiceLevel::Basic,
        ServiceLevel::Premium,
        ServiceLevel::Enterprise,
    ];

    /// Instruction injected into chat prompts for this tier
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            ServiceLevel::Basic => "Provide helpful but concise support.",
            ServiceLevel::Premium => "Provide detailed, personalized support with extra care.",
            ServiceLevel::Enterprise => {
                "Provide white-glove support with maximum attention to detail and proactive suggestions."
            }
        }
    }
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceLevel::Basic => write!(f, "basic"),
            ServiceLevel::Premium => write!(f, "premium"),
            ServiceLevel::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl FromStr for ServiceLevel {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(ServiceLevel::Basic),
            "premium" => Ok(ServiceLevel::Premium),
            "enterprise" => Ok(ServiceLevel::Enterprise),
            other => Err(HelpdeskError::InvalidInput(format!(
                "Invalid service level: {}. Must be one of: basic, premium, enterprise",
                other
            ))),
        }
    }
}

/// A user's thumbs rating on a chat message
///
/// Serialized as the integers `1`, `-1` and `0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "i8", try_from = "i8")]
pub enum Rating {
    /// Thumbs up
    Up,
    /// Thumbs down
    Down,
    /// Explicitly neutral
    Neutral,
}

impl Rating {
    /// Score contribution of this rating when averaging a session
    pub fn score(&self) -> f64 {
        match self {
            Rating::Up => 1.0,
            Rating::Down => 0.0,
            Rating::Neutral => NEUTRAL_SCORE,
        }
    }
}

impl From<Rating> for i8 {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Up => 1,
            Rating::Down => -1,
            Rating::Neutral => 0,
        }
    }
}

impl TryFrom<i8> for Rating {
    type Error = HelpdeskError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Up),
            -1 => Ok(Rating::Down),
            0 => Ok(Rating::Neutral),
            other => Err(HelpdeskError::InvalidInput(format!(
                "Invalid rating: {}. Must be 1, -1 or 0",
                other
            ))),
        }
    }
}

impl FromStr for Rating {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "+" | "1" | "+1" => Ok(Rating::Up),
            "down" | "-" | "-1" => Ok(Rating::Down),
            "neutral" | "0" => Ok(Rating::Neutral),
            other => Err(HelpdeskError::InvalidInput(format!(
                "Invalid rating: {}. Use up, down or neutral",
                other
            ))),
        }
    }
}

/// One observation in the sentiment history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentimentData {
    /// Score in [0, 1]
    pub score: f64,
    /// Human label for the score
    pub label: String,
    /// Tier the observation belongs to
    pub level: ServiceLevel,
    /// When it was observed
    pub timestamp: DateTime<Utc>,
    /// Session the observation came from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// Rating that produced the observation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<Rating>,
}

impl SentimentData {
    /// Build an observation stamped now, labelled from its score
    ///
    /// The score is clamped to [0, 1].
    ///
    /// # Examples
    ///
    /// ```
    /// use helpdesk::sentiment::{SentimentData, ServiceLevel};
    ///
    /// let data = SentimentData::new(1.4, ServiceLevel::Premium);
    /// assert_eq!(data.score, 1.0);
    /// assert_eq!(data.label, "Positive");
    /// ```
    pub fn new(score: f64, level: ServiceLevel) -> Self {
        let score = clamp_score(score);
        Self {
            score,
            label: label_for_score(score).to_string(),
            level,
            timestamp: Utc::now(),
            chat_id: None,
            user_rating: None,
        }
    }

    /// Observation produced by a user rating
    pub fn from_rating(rating: Rating, level: ServiceLevel, chat_id: impl Into<String>) -> Self {
        let mut data = Self::new(rating.score(), level);
        data.chat_id = Some(chat_id.into());
        data.user_rating = Some(rating);
        data
    }

    /// Attach the session id
    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }
}

/// Clamp a score into [0, 1]; NaN becomes neutral
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return NEUTRAL_SCORE;
    }
    score.clamp(0.0, 1.0)
}

/// Label used for a score in the portal
pub fn label_for_score(score: f64) -> &'static str {
    if score >= 0.7 {
        "Positive"
    } else if score >= 0.4 {
        "Neutral"
    } else {
        "Negative"
    }
}
