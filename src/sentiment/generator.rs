//! Weighted random sentiment generation
//!
//! Draws come from an injectable RNG so tests can use a seeded generator
//! while the simulator uses the thread-local one.

use super::{clamp_score, Scenario, ScenarioEntry, SentimentData, ServiceLevel};
use chrono::{Duration, Utc};
use rand::Rng;

/// Maximum absolute noise added to a drawn score
pub const NOISE_AMPLITUDE: f64 = 0.05;

/// Probability of each tier when none is supplied: basic, premium, enterprise
pub const SERVICE_LEVEL_DISTRIBUTION: [(ServiceLevel, f64); 3] = [
    (ServiceLevel::Basic, 0.5),
    (ServiceLevel::Premium, 0.3),
    (ServiceLevel::Enterprise, 0.2),
];

/// Pick one entry of a scenario by cumulative weight
///
/// A uniform draw in `[0, total)` is walked down the table, subtracting each
/// weight; the first entry that brings it to zero or below wins.
pub fn select_entry<R: Rng + ?Sized>(rng: &mut R, scenario: Scenario) -> ScenarioEntry {
    let entries = scenario.entries();
    let mut remaining = rng.random::<f64>() * f64::from(scenario.total_weight());

    for entry in entries {
        remaining -= f64::from(entry.weight);
        if remaining <= 0.0 {
            return *entry;
        }
    }

    // Float rounding can leave a sliver above zero after the last entry
    entries[entries.len() - 1]
}

/// Draw a service level from [`SERVICE_LEVEL_DISTRIBUTION`]
pub fn sample_service_level<R: Rng + ?Sized>(rng: &mut R) -> ServiceLevel {
    let draw = rng.random::<f64>();
    let mut cumulative = 0.0;
    for (level, probability) in SERVICE_LEVEL_DISTRIBUTION {
        cumulative += probability;
        if draw < cumulative {
            return level;
        }
    }
    ServiceLevel::Enterprise
}

/// Generate one sentiment observation for a scenario
///
/// The selected entry's score is perturbed by uniform noise in
/// `[-0.05, 0.05)` and clamped to [0, 1]. When `level` is `None` it is drawn
/// from the fixed tier distribution.
///
/// # Examples
///
/// ```
/// use helpdesk::sentiment::{generate_sentiment, Scenario, ServiceLevel};
///
/// let data = generate_sentiment(&mut rand::rng(), Scenario::Positive, Some(ServiceLevel::Premium));
/// assert!((0.0..=1.0).contains(&data.score));
/// assert_eq!(data.level, ServiceLevel::Premium);
/// ```
pub fn generate_sentiment<R: Rng + ?Sized>(
    rng: &mut R,
    scenario: Scenario,
    level: Option<ServiceLevel>,
) -> SentimentData {
    let entry = select_entry(rng, scenario);
    let noise = (rng.random::<f64>() - 0.5) * (NOISE_AMPLITUDE * 2.0);
    let score = clamp_score(entry.score + noise);
    let level = match level {
        Some(level) => level,
        None => sample_service_level(rng),
    };

    SentimentData {
        score,
        label: entry.label.to_string(),
        level,
        timestamp: Utc::now(),
        chat_id: None,
        user_rating: None,
    }
}

/// Generate `count` historical observations spread over the trailing range
///
/// Entry `i` is stamped `now - (count - i) * step`, so the batch is ordered
/// oldest first and ends one step before now.
pub fn generate_batch<R: Rng + ?Sized>(
    rng: &mut R,
    scenario: Scenario,
    count: usize,
    time_range_minutes: u32,
) -> Vec<SentimentData> {
    if count == 0 {
        return Vec::new();
    }

    let now = Utc::now();
    let range_ms = i64::from(time_range_minutes) * 60 * 1000;
    let step_ms = range_ms / count as i64;

    (0..count)
        .map(|i| {
            let mut data = generate_sentiment(rng, scenario, None);
            let offset = (count - i) as i64 * step_ms;
            data.timestamp = now - Duration::milliseconds(offset);
            data
        })
        .collect()
}
