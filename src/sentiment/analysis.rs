//! Keyword sentiment heuristics, canned replies and demo statistics

use super::{clamp_score, generate_sentiment, Scenario, ServiceLevel, NEUTRAL_SCORE};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const POSITIVE_WORDS: [&str; 10] = [
    "thank",
    "great",
    "excellent",
    "perfect",
    "awesome",
    "helpful",
    "amazing",
    "good",
    "love",
    "appreciate",
];

const NEGATIVE_WORDS: [&str; 11] = [
    "problem",
    "issue",
    "error",
    "broken",
    "fail",
    "bad",
    "terrible",
    "awful",
    "hate",
    "frustrated",
    "angry",
];

const KEYWORD_STEP: f64 = 0.1;

const POSITIVE_REPLIES: [&str; 4] = [
    "I'm happy to help you with that! Based on our documentation, here's what I recommend...",
    "Great question! I have the perfect solution for you...",
    "Absolutely! Let me guide you through this step by step...",
    "I understand completely. Here's exactly what you need to do...",
];

const NEUTRAL_REPLIES: [&str; 4] = [
    "I can help you with that. Let me look into this for you...",
    "I understand your question. Here's what I found...",
    "Based on your description, here are some options...",
    "Let me provide you with the relevant information...",
];

const NEGATIVE_REPLIES: [&str; 4] = [
    "I apologize for the confusion. Let me try to clarify...",
    "I understand your frustration. Let me help resolve this issue...",
    "I'm sorry you're experiencing this problem. Here's what we can do...",
    "I see the issue you're facing. Let me escalate this for immediate attention...",
];

/// Score a free-text message with keyword and punctuation heuristics
///
/// Starts at 0.5, adds 0.1 for each positive keyword present and subtracts
/// 0.1 for each negative one. Keywords are matched as lowercase substrings,
/// each counted at most once.
///
/// # Examples
///
/// ```
/// use helpdesk::sentiment::analysis::analyze_message_sentiment;
///
/// assert_eq!(analyze_message_sentiment("How do I reset it?"), 0.5);
/// assert!(analyze_message_sentiment("Great support, thank you!") > 0.7);
/// assert!(analyze_message_sentiment("This is broken!!!") < 0.4);
/// ```
pub fn analyze_message_sentiment(message: &str) -> f64 {
    let lower = message.to_lowercase();
    let mut score = NEUTRAL_SCORE;

    score += POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count() as f64 * KEYWORD_STEP;
    score -= NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count() as f64 * KEYWORD_STEP;

    if message.contains('!') && score > NEUTRAL_SCORE {
        score += 0.05;
    }
    if message.contains("!!!") {
        score -= 0.1;
    }
    if message.contains("?!") {
        score -= 0.05;
    }

    clamp_score(score)
}

/// Coarse polarity of a message, used to pick a canned reply
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    /// Above neutral is positive, below is negative
    pub fn from_score(score: f64) -> Self {
        if score > NEUTRAL_SCORE {
            SentimentClass::Positive
        } else if score < NEUTRAL_SCORE {
            SentimentClass::Negative
        } else {
            SentimentClass::Neutral
        }
    }

    fn replies(&self) -> &'static [&'static str] {
        match self {
            SentimentClass::Positive => &POSITIVE_REPLIES,
            SentimentClass::Neutral => &NEUTRAL_REPLIES,
            SentimentClass::Negative => &NEGATIVE_REPLIES,
        }
    }
}

impl fmt::Display for SentimentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentClass::Positive => write!(f, "positive"),
            SentimentClass::Neutral => write!(f, "neutral"),
            SentimentClass::Negative => write!(f, "negative"),
        }
    }
}

/// Pick one canned support reply for a sentiment class
pub fn canned_reply<R: Rng + ?Sized>(rng: &mut R, class: SentimentClass) -> &'static str {
    class
        .replies()
        .choose(rng)
        .copied()
        .unwrap_or(NEUTRAL_REPLIES[0])
}

/// Summary of a list of scores
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct DemoStats {
    /// Mean, rounded to two decimals
    pub average: f64,
    /// Lowest score, rounded to two decimals
    pub min: f64,
    /// Highest score, rounded to two decimals
    pub max: f64,
    /// Percentage of scores >= 0.7
    pub positive: u32,
    /// Percentage of scores in [0.4, 0.7)
    pub neutral: u32,
    /// Percentage of scores < 0.4
    pub negative: u32,
}

/// Summarize scores; an empty slice yields all zeros
pub fn calculate_stats(scores: &[f64]) -> DemoStats {
    if scores.is_empty() {
        return DemoStats::default();
    }

    let n = scores.len() as f64;
    let average = scores.iter().sum::<f64>() / n;
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let positive = scores.iter().filter(|s| **s >= 0.7).count();
    let neutral = scores.iter().filter(|s| **s >= 0.4 && **s < 0.7).count();
    let negative = scores.iter().filter(|s| **s < 0.4).count();

    let percent = |count: usize| (count as f64 / n * 100.0).round() as u32;

    DemoStats {
        average: round2(average),
        min: round2(min),
        max: round2(max),
        positive: percent(positive),
        neutral: percent(neutral),
        negative: percent(negative),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scenario each tier is sampled from in the service-level comparison
pub fn scenario_for_level(level: ServiceLevel) -> Scenario {
    match level {
        ServiceLevel::Basic => Scenario::VeryNegative,
        ServiceLevel::Premium => Scenario::Balanced,
        ServiceLevel::Enterprise => Scenario::Positive,
    }
}

/// Draw `count` scores per tier and summarize each
pub fn service_level_comparison<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
) -> Vec<(ServiceLevel, DemoStats)> {
    ServiceLevel::ALL
        .into_iter()
        .map(|level| {
            let scenario = scenario_for_level(level);
            let scores: Vec<f64> = (0..count)
                .map(|_| generate_sentiment(rng, scenario, Some(level)).score)
                .collect();
            (level, calculate_stats(&scores))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_neutral_message() {
        assert_eq!(analyze_message_sentiment("How do I update billing?"), 0.5);
    }

    #[test]
    fn test_positive_keywords_with_excitement() {
        // great + helpful = 0.7, '!' while above neutral = 0.75
        assert!(approx(
            analyze_message_sentiment("Great support, very helpful!"),
            0.75
        ));
    }

    #[test]
    fn test_negative_keywords_with_frustration() {
        // terrible = 0.4, '!' ignored below neutral
        assert!(approx(
            analyze_message_sentiment("This is terrible, nothing works!"),
            0.4
        ));
        // broken + error = 0.3, '!!!' = 0.2
        assert!(approx(
            analyze_message_sentiment("Broken again, error everywhere!!!"),
            0.2
        ));
    }

    #[test]
    fn test_confused_punctuation() {
        assert!(approx(analyze_message_sentiment("What?!"), 0.45));
    }

    #[test]
    fn test_keyword_counted_once() {
        assert!(approx(analyze_message_sentiment("good good good"), 0.6));
    }

    #[test]
    fn test_score_clamped() {
        let angry = "problem issue error broken fail bad terrible awful hate frustrated angry";
        assert_eq!(analyze_message_sentiment(angry), 0.0);
        let happy = "thank great excellent perfect awesome helpful amazing good love appreciate!";
        assert_eq!(analyze_message_sentiment(happy), 1.0);
    }

    #[test]
    fn test_sentiment_class_from_score() {
        assert_eq!(SentimentClass::from_score(0.6), SentimentClass::Positive);
        assert_eq!(SentimentClass::from_score(0.5), SentimentClass::Neutral);
        assert_eq!(SentimentClass::from_score(0.1), SentimentClass::Negative);
    }

    #[test]
    fn test_canned_reply_comes_from_class_table() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..50 {
            let reply = canned_reply(&mut rng, SentimentClass::Negative);
            assert!(NEGATIVE_REPLIES.contains(&reply));
        }
    }

    #[test]
    fn test_calculate_stats() {
        let stats = calculate_stats(&[0.9, 0.75, 0.5, 0.1]);
        assert!(approx(stats.average, 0.56));
        assert!(approx(stats.min, 0.1));
        assert!(approx(stats.max, 0.9));
        assert_eq!(stats.positive, 50);
        assert_eq!(stats.neutral, 25);
        assert_eq!(stats.negative, 25);
    }

    #[test]
    fn test_calculate_stats_empty() {
        assert_eq!(calculate_stats(&[]), DemoStats::default());
    }

    #[test]
    fn test_service_level_comparison_orders_tiers() {
        let mut rng = StdRng::seed_from_u64(21);
        let comparison = service_level_comparison(&mut rng, 500);
        assert_eq!(comparison.len(), 3);
        let basic = comparison[0].1.average;
        let premium = comparison[1].1.average;
        let enterprise = comparison[2].1.average;
        assert!(basic < premium && premium < enterprise);
    }
}
