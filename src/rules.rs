//! Ordered rewrite rule tables.
//!
//! Both tables are evaluated top to bottom and the first rule that matches is
//! the only one applied. Rule order is part of the behaviour; tests pin it.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::rewrite::Change;

/// A category of harsh words, each mapped to a softer phrase.
pub struct SofteningRule {
    pub name: &'static str,
    words: &'static [(&'static str, &'static str)],
    pattern: Regex,
}

impl SofteningRule {
    fn new(name: &'static str, words: &'static [(&'static str, &'static str)]) -> Self {
        let alternation = words
            .iter()
            .map(|(harsh, _)| regex::escape(harsh))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
            .expect("softening pattern is valid");

        Self {
            name,
            words,
            pattern,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    fn softer(&self, word: &str) -> Option<&'static str> {
        let lower = word.to_lowercase();
        self.words
            .iter()
            .find(|(harsh, _)| *harsh == lower)
            .map(|(_, soft)| *soft)
    }

    /// Replace every word of this category, keeping punctuation and leading capitals.
    pub fn apply(&self, text: &str) -> (String, Vec<Change>) {
        let mut changes = Vec::new();
        let improved = self
            .pattern
            .replace_all(text, |caps: &Captures| {
                let original = &caps[0];
                let replacement = match self.softer(original) {
                    Some(soft) => match_case(original, soft),
                    None => original.to_string(),
                };
                changes.push(Change::new(
                    "Softened harsh wording",
                    format!("'{}' → '{}'", original, replacement),
                ));
                replacement
            })
            .into_owned();

        (improved, changes)
    }
}

/// A sentence-level rephrasing: regex plus a `$n` replacement template.
pub struct PatternRule {
    pub name: &'static str,
    description: &'static str,
    pattern: Regex,
    template: &'static str,
}

impl PatternRule {
    fn new(
        name: &'static str,
        description: &'static str,
        pattern: &str,
        template: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            pattern: Regex::new(pattern).expect("sentence pattern is valid"),
            template,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn apply(&self, text: &str) -> (String, Vec<Change>) {
        let mut changes = Vec::new();
        let improved = self
            .pattern
            .replace_all(text, |caps: &Captures| {
                let mut expanded = String::new();
                caps.expand(self.template, &mut expanded);
                let replacement = match_case(&caps[0], &expanded);
                changes.push(Change::new(
                    self.description,
                    format!("'{}' → '{}'", &caps[0], replacement),
                ));
                replacement
            })
            .into_owned();

        (improved, changes)
    }
}

pub static SOFTENING_RULES: Lazy<Vec<SofteningRule>> = Lazy::new(|| {
    vec![
        SofteningRule::new(
            "harsh_judgement",
            &[
                ("terrible", "not great"),
                ("awful", "not great"),
                ("horrible", "not great"),
                ("atrocious", "not great"),
            ],
        ),
        SofteningRule::new(
            "worthlessness",
            &[
                ("useless", "not helpful"),
                ("worthless", "not helpful"),
                ("pointless", "not helpful"),
            ],
        ),
        SofteningRule::new(
            "hostility",
            &[("hate", "dislike"), ("hated", "disliked"), ("despise", "dislike")],
        ),
        SofteningRule::new(
            "insult",
            &[
                ("stupid", "unclear"),
                ("dumb", "unclear"),
                ("idiotic", "unclear"),
                ("ridiculous", "surprising"),
            ],
        ),
        SofteningRule::new("superlative", &[("worst", "least helpful")]),
        SofteningRule::new(
            "disgust",
            &[("disgusting", "unpleasant"), ("gross", "unpleasant")],
        ),
        SofteningRule::new(
            "junk",
            &[
                ("garbage", "not up to standard"),
                ("trash", "not up to standard"),
                ("rubbish", "not up to standard"),
            ],
        ),
        SofteningRule::new(
            "incompetence",
            &[("incompetent", "underwhelming"), ("pathetic", "underwhelming")],
        ),
    ]
});

pub static PATTERN_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(
            "blanket_judgement",
            "Reframed a blanket judgement as room for improvement",
            r"(?i)\bthis is (?:absolutely |completely |totally |just )?(?:terrible|awful|horrible|the worst)\b",
            "this could be improved",
        ),
        PatternRule::new(
            "hostility",
            "Replaced hostile phrasing with a milder preference",
            r"(?i)\bI (?:really |absolutely )?hate\b",
            "I really dislike",
        ),
        PatternRule::new(
            "waste",
            "Rephrased a wasted-effort complaint",
            r"(?i)\b(?:what a |a |total |complete )?waste of (time|money)\b",
            "not the best use of ${1}",
        ),
        PatternRule::new(
            "personal_attack",
            "Turned a personal attack into an observation",
            r"(?i)\byou(?: are|'re) (?:so |really |completely )?(?:stupid|an idiot|idiots|incompetent|useless)\b",
            "you may have missed something",
        ),
        PatternRule::new(
            "dismissal",
            "Replaced a dismissive command",
            r"(?i)\bshut up\b",
            "please hear me out",
        ),
        PatternRule::new(
            "crude_verdict",
            "Replaced a crude verdict with a personal observation",
            r"(?i)\bthis (?:sucks|is garbage|is trash|is rubbish)\b",
            "this is not working for me",
        ),
        PatternRule::new(
            "shouting",
            "Toned down repeated exclamation marks",
            r"!{2,}",
            "!",
        ),
    ]
});

/// Applies the first softening category that matches, if any.
pub fn soften_harsh_words(text: &str) -> Option<(String, Vec<Change>)> {
    let rule = SOFTENING_RULES.iter().find(|rule| rule.matches(text))?;
    tracing::debug!("Softening rule '{}' matched", rule.name);
    Some(rule.apply(text))
}

/// Applies the first sentence pattern that matches, if any.
pub fn apply_first_pattern(text: &str) -> Option<(String, Vec<Change>)> {
    let rule = PATTERN_RULES.iter().find(|rule| rule.matches(text))?;
    tracing::debug!("Pattern rule '{}' matched", rule.name);
    Some(rule.apply(text))
}

/// Capitalizes `replacement` when `original` starts with an uppercase letter.
pub fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().map_or(false, char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }

    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
