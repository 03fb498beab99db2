//! Rolling aggregate and trend over the sentiment history

use super::{SentimentData, NEUTRAL_SCORE};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum difference between half means that counts as a trend
pub const TREND_THRESHOLD: f64 = 0.05;

/// Default trailing window
pub const DEFAULT_WINDOW_MINUTES: u32 = 5;

/// Direction of recent sentiment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Second half of the window scores higher
    Up,
    /// Second half of the window scores lower
    Down,
    /// No difference beyond the threshold
    #[default]
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Average and trend over a trailing window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AggregateSentiment {
    /// Mean score inside the window
    pub average: f64,
    /// Direction of change across the window
    pub trend: Trend,
    /// Number of observations inside the window
    pub samples: usize,
}

impl AggregateSentiment {
    /// Value reported when the window holds nothing
    pub fn neutral() -> Self {
        Self {
            average: NEUTRAL_SCORE,
            trend: Trend::Stable,
            samples: 0,
        }
    }
}

impl Default for AggregateSentiment {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Aggregate the history relative to the current time
///
/// # Examples
///
/// ```
/// use helpdesk::sentiment::{calculate_aggregate, Trend};
///
/// let aggregate = calculate_aggregate(&[], 5);
/// assert_eq!(aggregate.average, 0.5);
/// assert_eq!(aggregate.trend, Trend::Stable);
/// ```
pub fn calculate_aggregate(data: &[SentimentData], window_minutes: u32) -> AggregateSentiment {
    calculate_aggregate_at(data, window_minutes, Utc::now())
}

/// Aggregate the history relative to `now`
///
/// Entries with `now - timestamp <= window` are kept in their original
/// order. The kept points are split at `len / 2`; the trend compares the
/// mean of the second part with the mean of the first. An empty part has a
/// mean of 0, so a single point above the threshold reads as [`Trend::Up`].
pub fn calculate_aggregate_at(
    data: &[SentimentData],
    window_minutes: u32,
    now: DateTime<Utc>,
) -> AggregateSentiment {
    let window = Duration::minutes(i64::from(window_minutes));
    let recent: Vec<f64> = data
        .iter()
        .filter(|d| now - d.timestamp <= window)
        .map(|d| d.score)
        .collect();

    if recent.is_empty() {
        return AggregateSentiment::neutral();
    }

    let average = mean(&recent);
    let (first, second) = recent.split_at(recent.len() / 2);
    let trend = classify_trend(mean(first), mean(second));

    AggregateSentiment {
        average,
        trend,
        samples: recent.len(),
    }
}

/// Classify the change between two half means
pub fn classify_trend(first_mean: f64, second_mean: f64) -> Trend {
    if second_mean - first_mean > TREND_THRESHOLD {
        Trend::Up
    } else if first_mean - second_mean > TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::ServiceLevel;

    fn point(score: f64, seconds_ago: i64, now: DateTime<Utc>) -> SentimentData {
        let mut data = SentimentData::new(score, ServiceLevel::Basic);
        data.timestamp = now - Duration::seconds(seconds_ago);
        data
    }

    fn series(scores: &[f64], now: DateTime<Utc>) -> Vec<SentimentData> {
        let n = scores.len() as i64;
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| point(*s, (n - i as i64) * 10, now))
            .collect()
    }

    #[test]
    fn test_empty_history_is_neutral_and_stable() {
        let aggregate = calculate_aggregate(&[], 5);
        assert_eq!(aggregate.average, 0.5);
        assert_eq!(aggregate.trend, Trend::Stable);
        assert_eq!(aggregate.samples, 0);
    }

    #[test]
    fn test_entries_outside_window_are_ignored() {
        let now = Utc::now();
        let data = vec![point(0.0, 600, now), point(0.8, 30, now)];
        let aggregate = calculate_aggregate_at(&data, 5, now);
        assert_eq!(aggregate.samples, 1);
        assert!((aggregate.average - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_all_entries_stale_is_neutral() {
        let now = Utc::now();
        let data = vec![point(0.9, 3_600, now)];
        assert_eq!(
            calculate_aggregate_at(&data, 5, now),
            AggregateSentiment::neutral()
        );
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Utc::now();
        let data = vec![point(0.2, 300, now)];
        assert_eq!(calculate_aggregate_at(&data, 5, now).samples, 1);
    }

    #[test]
    fn test_upward_trend() {
        let now = Utc::now();
        let data = series(&[0.3, 0.3, 0.5, 0.5], now);
        let aggregate = calculate_aggregate_at(&data, 5, now);
        assert_eq!(aggregate.trend, Trend::Up);
        assert!((aggregate.average - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_downward_trend() {
        let now = Utc::now();
        let data = series(&[0.9, 0.8, 0.4, 0.3], now);
        assert_eq!(calculate_aggregate_at(&data, 5, now).trend, Trend::Down);
    }

    #[test]
    fn test_small_change_is_stable() {
        let now = Utc::now();
        let data = series(&[0.50, 0.50, 0.54, 0.54], now);
        assert_eq!(calculate_aggregate_at(&data, 5, now).trend, Trend::Stable);
    }

    #[test]
    fn test_odd_length_puts_middle_point_in_second_half() {
        let now = Utc::now();
        // first = [0.2], second = [0.6, 0.6]
        let data = series(&[0.2, 0.6, 0.6], now);
        assert_eq!(calculate_aggregate_at(&data, 5, now).trend, Trend::Up);
    }

    #[test]
    fn test_single_point_compares_against_empty_half() {
        let now = Utc::now();
        let aggregate = calculate_aggregate_at(&[point(0.9, 0, now)], 5, now);
        assert_eq!(aggregate.trend, Trend::Up);
        assert_eq!(aggregate.samples, 1);
        assert!((aggregate.average - 0.9).abs() < 1e-9);

        // Only a score within the threshold of zero stays stable
        let low = calculate_aggregate_at(&[point(0.04, 0, now)], 5, now);
        assert_eq!(low.trend, Trend::Stable);
    }

    #[test]
    fn test_classify_trend_threshold() {
        assert_eq!(classify_trend(0.5, 0.54), Trend::Stable);
        assert_eq!(classify_trend(0.54, 0.5), Trend::Stable);
        assert_eq!(classify_trend(0.5, 0.56), Trend::Up);
        assert_eq!(classify_trend(0.56, 0.5), Trend::Down);
    }
}
