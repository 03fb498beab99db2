//! Weighted scenario tables for the sentiment generator

use crate::error::HelpdeskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One weighted outcome in a scenario table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioEntry {
    /// Base score before noise
    pub score: f64,
    /// Label reported with the score
    pub label: &'static str,
    /// Relative weight within the table
    pub weight: u32,
}

const BALANCED: [ScenarioEntry; 3] = [
    ScenarioEntry {
        score: 0.7,
        label: "Positive",
        weight: 40,
    },
    ScenarioEntry {
        score: 0.4,
        label: "Neutral",
        weight: 30,
    },
    ScenarioEntry {
        score: 0.2,
        label: "Negative",
        weight: 30,
    },
];

const VERY_NEGATIVE: [ScenarioEntry; 3] = [
    ScenarioEntry {
        score: 0.1,
        label: "Very Negative",
        weight: 50,
    },
    ScenarioEntry {
        score: 0.3,
        label: "Negative",
        weight: 30,
    },
    ScenarioEntry {
        score: 0.5,
        label: "Neutral",
        weight: 20,
    },
];

const POSITIVE: [ScenarioEntry; 3] = [
    ScenarioEntry {
        score: 0.9,
        label: "Excellent",
        weight: 40,
    },
    ScenarioEntry {
        score: 0.8,
        label: "Very Positive",
        weight: 40,
    },
    ScenarioEntry {
        score: 0.6,
        label: "Good",
        weight: 20,
    },
];

/// Named sentiment scenario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum Scenario {
    /// Mix of positive, negative, and neutral interactions
    #[default]
    Balanced,
    /// Predominantly negative customer interactions
    VeryNegative,
    /// Mostly positive customer satisfaction
    Positive,
}

impl Scenario {
    /// All scenarios in display order
    pub const ALL: [Scenario; 3] = [
        Scenario::Balanced,
        Scenario::VeryNegative,
        Scenario::Positive,
    ];

    /// The weighted table for this scenario
    pub fn entries(&self) -> &'static [ScenarioEntry] {
        match self {
            Scenario::Balanced => &BALANCED,
            Scenario::VeryNegative => &VERY_NEGATIVE,
            Scenario::Positive => &POSITIVE,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Balanced => "Balanced Sentiment",
            Scenario::VeryNegative => "Very Negative Sentiment",
            Scenario::Positive => "Positive Sentiment",
        }
    }

    /// One-line description
    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Balanced => "Mix of positive, negative, and neutral interactions",
            Scenario::VeryNegative => "Predominantly negative customer interactions",
            Scenario::Positive => "Mostly positive customer satisfaction",
        }
    }

    /// Sum of the table's weights
    pub fn total_weight(&self) -> u32 {
        self.entries().iter().map(|e| e.weight).sum()
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Balanced => write!(f, "balanced"),
            Scenario::VeryNegative => write!(f, "very-negative"),
            Scenario::Positive => write!(f, "positive"),
        }
    }
}

impl FromStr for Scenario {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "balanced" => Ok(Scenario::Balanced),
            "verynegative" => Ok(Scenario::VeryNegative),
            "positive" => Ok(Scenario::Positive),
            _ => Err(HelpdeskError::InvalidInput(format!(
                "Unknown scenario: {}. Must be one of: balanced, very-negative, positive",
                s
            ))),
        }
    }
}
