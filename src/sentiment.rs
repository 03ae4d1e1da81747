//! Lexicon-based sentiment scoring.
//!
//! Polarity and subjectivity are averaged over every word found in a small
//! adjective/verb lexicon. An intensifier directly before a word scales it,
//! and a pending negation ("not", "never", "don't", ...) flips and halves the
//! next opinion word, unless another word longer than one letter comes first.
//! No external ML dependencies.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

// (polarity, subjectivity)
static LEXICON: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    vec![
        // positive
        ("good", (0.7, 0.6)),
        ("great", (0.8, 0.75)),
        ("excellent", (1.0, 1.0)),
        ("amazing", (0.6, 0.9)),
        ("wonderful", (1.0, 1.0)),
        ("fantastic", (0.4, 0.9)),
        ("awesome", (1.0, 1.0)),
        ("brilliant", (0.9, 1.0)),
        ("outstanding", (0.5, 0.5)),
        ("perfect", (1.0, 1.0)),
        ("best", (1.0, 0.3)),
        ("better", (0.5, 0.5)),
        ("nice", (0.6, 1.0)),
        ("love", (0.5, 0.6)),
        ("loved", (0.7, 0.8)),
        ("lovely", (0.5, 0.75)),
        ("happy", (0.8, 1.0)),
        ("glad", (0.5, 1.0)),
        ("pleased", (0.5, 1.0)),
        ("beautiful", (0.85, 1.0)),
        ("helpful", (0.3, 0.3)),
        ("useful", (0.3, 0.0)),
        ("interesting", (0.5, 0.5)),
        ("easy", (0.43, 0.83)),
        ("clear", (0.1, 0.38)),
        ("fine", (0.42, 0.5)),
        ("okay", (0.5, 0.5)),
        ("decent", (0.17, 0.67)),
        ("fast", (0.2, 0.6)),
        ("friendly", (0.38, 0.5)),
        ("impressive", (1.0, 1.0)),
        ("enjoyable", (0.5, 0.7)),
        ("satisfied", (0.5, 1.0)),
        ("recommended", (0.3, 0.4)),
        // negative
        ("bad", (-0.7, 0.67)),
        ("terrible", (-1.0, 1.0)),
        ("awful", (-1.0, 1.0)),
        ("horrible", (-1.0, 1.0)),
        ("atrocious", (-1.0, 1.0)),
        ("worst", (-1.0, 1.0)),
        ("worse", (-0.4, 0.6)),
        ("useless", (-0.5, 0.0)),
        ("worthless", (-0.8, 0.9)),
        ("pointless", (-0.5, 0.75)),
        ("hate", (-0.8, 0.9)),
        ("hated", (-0.9, 0.7)),
        ("despise", (-0.8, 0.9)),
        ("boring", (-1.0, 1.0)),
        ("stupid", (-0.8, 1.0)),
        ("dumb", (-0.38, 0.5)),
        ("idiotic", (-0.8, 1.0)),
        ("ridiculous", (-0.33, 1.0)),
        ("ugly", (-0.7, 1.0)),
        ("broken", (-0.4, 0.4)),
        ("poor", (-0.4, 0.6)),
        ("slow", (-0.3, 0.4)),
        ("disappointing", (-0.6, 0.7)),
        ("disappointed", (-0.75, 0.75)),
        ("annoying", (-0.8, 0.9)),
        ("sad", (-0.5, 1.0)),
        ("angry", (-0.5, 1.0)),
        ("unhappy", (-0.6, 0.9)),
        ("frustrating", (-0.4, 0.7)),
        ("frustrated", (-0.7, 0.4)),
        ("difficult", (-0.5, 1.0)),
        ("confusing", (-0.3, 0.7)),
        ("wrong", (-0.5, 0.9)),
        ("pathetic", (-1.0, 1.0)),
        ("disgusting", (-1.0, 1.0)),
        ("gross", (-0.8, 0.9)),
        ("garbage", (-0.6, 0.8)),
        ("trash", (-0.6, 0.8)),
        ("rubbish", (-0.6, 0.8)),
        ("incompetent", (-0.5, 0.75)),
        ("lazy", (-0.25, 1.0)),
        ("rude", (-0.3, 0.6)),
        ("sloppy", (-0.5, 0.8)),
        ("mediocre", (-0.2, 0.6)),
        ("expensive", (-0.5, 0.7)),
    ]
    .into_iter()
    .collect()
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    vec![
        ("very", 1.3),
        ("really", 1.3),
        ("so", 1.2),
        ("too", 1.2),
        ("extremely", 1.5),
        ("incredibly", 1.4),
        ("absolutely", 1.4),
        ("totally", 1.3),
        ("completely", 1.3),
        ("quite", 1.1),
    ]
    .into_iter()
    .collect()
});

const NEGATIONS: &[&str] = &["not", "never", "no", "hardly", "barely"];

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z]+(?:['’][A-Za-z]+)?|[.!?;]").expect("token pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > 0.0 {
            SentimentLabel::Positive
        } else if polarity < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ConfidenceLevel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl ConfidenceLevel {
    /// Cut points are exclusive on the lower side: 0.7 is High, not Very High.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            ConfidenceLevel::VeryHigh
        } else if confidence > 0.3 {
            ConfidenceLevel::High
        } else if confidence > 0.1 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Moderate => "Moderate",
            ConfidenceLevel::High => "High",
            ConfidenceLevel::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw analyzer output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Polarity {
    pub polarity: f64,
    pub subjectivity: f64,
}

/// Anything that can produce polarity/subjectivity for a piece of text.
pub trait PolarityAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Polarity;
}

/// Default analyzer backed by the built-in lexicon.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconAnalyzer;

impl PolarityAnalyzer for LexiconAnalyzer {
    fn analyze(&self, text: &str) -> Polarity {
        let mut scored: Vec<(f64, f64)> = Vec::new();
        let mut intensity: Option<f64> = None;
        let mut negated = false;

        for token in TOKEN_RE.find_iter(text) {
            let word = token.as_str().to_lowercase();

            if matches!(word.as_str(), "." | "!" | "?" | ";") {
                intensity = None;
                negated = false;
                continue;
            }

            let contraction = word.ends_with("n't") || word.ends_with("n’t");
            if contraction || NEGATIONS.contains(&word.as_str()) {
                negated = true;
                intensity = None;
                continue;
            }

            if let Some(factor) = INTENSIFIERS.get(word.as_str()) {
                intensity = Some(*factor);
                continue;
            }

            match LEXICON.get(word.as_str()) {
                Some(&(p, s)) => {
                    let factor = intensity.take().unwrap_or(1.0);
                    let mut p = (p * factor).clamp(-1.0, 1.0);
                    let s = (s * factor).clamp(0.0, 1.0);
                    if negated {
                        p *= -0.5;
                        negated = false;
                    }
                    scored.push((p, s));
                }
                None => {
                    // Modifiers only bind to the very next word; single letters
                    // ("a", "I") do not break a negation
                    intensity = None;
                    if word.len() > 1 {
                        negated = false;
                    }
                }
            }
        }

        if scored.is_empty() {
            return Polarity::default();
        }

        let n = scored.len() as f64;
        let polarity = scored.iter().map(|(p, _)| p).sum::<f64>() / n;
        let subjectivity = scored.iter().map(|(_, s)| s).sum::<f64>() / n;

        Polarity {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: subjectivity.clamp(0.0, 1.0),
        }
    }
}

/// Result of sentiment analysis
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SentimentResult {
    pub polarity: f64,
    #[schema(example = 0.5)]
    pub subjectivity: f64,
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub word_count: usize,
    pub char_count: usize,
    pub computed_at: DateTime<Utc>,
}

/// Scores text with the built-in lexicon analyzer.
pub fn score(text: &str) -> SentimentResult {
    score_with(&LexiconAnalyzer, text)
}

/// Scores text with any analyzer. Never fails, including for empty input.
pub fn score_with(analyzer: &dyn PolarityAnalyzer, text: &str) -> SentimentResult {
    let Polarity {
        polarity,
        subjectivity,
    } = analyzer.analyze(text);
    let confidence = polarity.abs();

    let result = SentimentResult {
        polarity,
        subjectivity,
        label: SentimentLabel::from_polarity(polarity),
        confidence,
        confidence_level: ConfidenceLevel::from_confidence(confidence),
        word_count: text.split_whitespace().count(),
        char_count: text.chars().count(),
        computed_at: Utc::now(),
    };

    tracing::debug!(
        "🧠 Sentiment analysis: {} words, polarity {:.3}, {}",
        result.word_count,
        result.polarity,
        result.label
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl PolarityAnalyzer for Fixed {
        fn analyze(&self, _text: &str) -> Polarity {
            Polarity {
                polarity: self.0,
                subjectivity: 0.5,
            }
        }
    }

    #[test]
    fn test_label_follows_polarity_sign() {
        assert_eq!(score_with(&Fixed(0.2), "x").label, SentimentLabel::Positive);
        assert_eq!(score_with(&Fixed(-0.01), "x").label, SentimentLabel::Negative);
        assert_eq!(score_with(&Fixed(0.0), "x").label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_confidence_level_boundaries() {
        assert_eq!(ConfidenceLevel::from_confidence(0.71), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_confidence(0.70), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.31), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.30), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_confidence(0.11), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_confidence(0.10), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_confidence(0.0), ConfidenceLevel::Low);
    }

    #[test]
    fn test_confidence_uses_absolute_polarity() {
        let result = score_with(&Fixed(-0.8), "x");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.confidence_level, ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn test_negative_sentiment() {
        let result = score("This is terrible and useless");
        assert!((result.polarity - -0.75).abs() < 1e-9);
        assert!((result.subjectivity - 0.5).abs() < 1e-9);
        assert_eq!(result.label, SentimentLabel::Negative);
        assert_eq!(result.confidence_level, ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn test_positive_sentiment() {
        let result = score("The support team was great and really helpful!");
        assert!(result.polarity > 0.0);
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[test]
    fn test_neutral_sentiment() {
        let result = score("The package arrived on Tuesday.");
        assert_eq!(result.polarity, 0.0);
        assert_eq!(result.subjectivity, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_negation_flips_and_halves() {
        let result = score("This is not good");
        assert!((result.polarity - -0.35).abs() < 1e-9);

        let contraction = score("It isn't good");
        assert!((contraction.polarity - -0.35).abs() < 1e-9);
    }

    #[test]
    fn test_negation_does_not_reach_past_other_words() {
        let result = score("No problem, the service was great");
        assert!((result.polarity - 0.8).abs() < 1e-9);
        assert_eq!(result.label, SentimentLabel::Positive);

        let result = score("I do not think anything here is great");
        assert!((result.polarity - 0.8).abs() < 1e-9);
        assert_eq!(result.label, SentimentLabel::Positive);
    }

    #[test]
    fn test_negation_survives_articles_and_intensifiers() {
        assert!((score("This is not a good idea").polarity - -0.35).abs() < 1e-9);
        assert!((score("not very good").polarity - -0.455).abs() < 1e-9);
    }

    #[test]
    fn test_curly_apostrophe_contraction_negates() {
        let result = score("It isn’t good");
        assert!((result.polarity - -0.35).abs() < 1e-9);
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_negation_resets_at_sentence_end() {
        let result = score("Not today. Good work");
        assert!((result.polarity - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_intensifier_scales_next_word_only() {
        let plain = score("good").polarity;
        let boosted = score("very good").polarity;
        assert!(boosted > plain);
        assert!((boosted - 0.91).abs() < 1e-9);

        let detached = score("very nice and good").polarity;
        // "very" applies to "nice", not to "good"
        assert!((detached - (0.78 + 0.7) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_polarity_is_clamped() {
        let result = score("extremely excellent");
        assert_eq!(result.polarity, 1.0);
        assert_eq!(result.subjectivity, 1.0);
    }

    #[test]
    fn test_counts_use_raw_text() {
        let result = score("  two words  ");
        assert_eq!(result.word_count, 2);
        assert_eq!(result.char_count, 13);

        let accented = score("café ok");
        assert_eq!(accented.char_count, 7);
    }

    #[test]
    fn test_empty_text_does_not_panic() {
        let result = score("");
        assert_eq!(result.word_count, 0);
        assert_eq!(result.char_count, 0);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_serializes_as_sentiment_key() {
        let json = serde_json::to_value(score_with(&Fixed(0.9), "x")).unwrap();
        assert_eq!(json["sentiment"], "Positive");
        assert_eq!(json["confidence_level"], "Very High");
    }
}
