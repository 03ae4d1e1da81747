//! Tone-improvement rewrites.
//!
//! `RewriteEngine` tries an optional primary [`Rewriter`] (the remote AI one
//! when configured) and always falls back to [`LocalRewriter`], so callers
//! get a result for every input.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

use crate::ai::RemoteRewriter;
use crate::config::{Config, RewriteStrategy};
use crate::rules;
use crate::sentiment;

/// Appended when no substitution applies so `changes` is never empty.
pub const ACKNOWLEDGMENT: &str = "Thank you for considering this feedback.";

/// Polarity below which harsh-word softening kicks in.
pub const HARSH_THRESHOLD: f64 = -0.5;

const MINIMAL_EXPLANATION: &str =
    "Only minor tone adjustments were made; the original meaning is preserved.";
const PATTERN_EXPLANATION: &str =
    "A harsh sentence pattern was rephrased; the rest of the comment is unchanged.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMethod {
    #[serde(rename = "ai_enhanced")]
    AIEnhanced,
    PatternRewrite,
    MinimalAdjustment,
    NoChange,
}

/// One entry of the change log: what was done and the specifics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Change {
    pub description: String,
    pub detail: String,
}

impl Change {
    pub fn new(description: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RewriteResult {
    pub improved_text: String,
    pub changes: Vec<Change>,
    pub original_length: usize,
    pub improved_length: usize,
    pub method: RewriteMethod,
    pub original_polarity: f64,
    pub explanation: String,
}

impl RewriteResult {
    pub fn new(
        original: &str,
        improved_text: String,
        changes: Vec<Change>,
        method: RewriteMethod,
        original_polarity: f64,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            original_length: original.chars().count(),
            improved_length: improved_text.chars().count(),
            improved_text,
            changes,
            method,
            original_polarity,
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rewrite service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed rewrite response: {0}")]
    Malformed(String),

    #[error("rewrite service returned an empty completion")]
    EmptyCompletion,
}

/// A strategy that turns a comment into a gentler version of itself.
#[async_trait]
pub trait Rewriter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn rewrite(&self, text: &str) -> Result<RewriteResult, RewriteError>;
}

/// Rule-based rewriter; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRewriter {
    strategy: RewriteStrategy,
}

impl LocalRewriter {
    pub fn new(strategy: RewriteStrategy) -> Self {
        Self { strategy }
    }

    pub fn rewrite_text(&self, text: &str) -> RewriteResult {
        let polarity = sentiment::score(text).polarity;

        if self.strategy == RewriteStrategy::Pattern {
            if let Some((improved, changes)) = rules::apply_first_pattern(text) {
                return RewriteResult::new(
                    text,
                    improved,
                    changes,
                    RewriteMethod::PatternRewrite,
                    polarity,
                    PATTERN_EXPLANATION,
                );
            }
        }

        let softened = if polarity < HARSH_THRESHOLD {
            rules::soften_harsh_words(text)
        } else {
            None
        };

        let (improved, changes) = softened.unwrap_or_else(|| {
            (
                format!("{} {}", text.trim_end(), ACKNOWLEDGMENT),
                vec![Change::new("Added a courteous closing", ACKNOWLEDGMENT)],
            )
        });

        RewriteResult::new(
            text,
            improved,
            changes,
            RewriteMethod::MinimalAdjustment,
            polarity,
            MINIMAL_EXPLANATION,
        )
    }
}

#[async_trait]
impl Rewriter for LocalRewriter {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn rewrite(&self, text: &str) -> Result<RewriteResult, RewriteError> {
        Ok(self.rewrite_text(text))
    }
}

/// Primary rewriter (if any) with a guaranteed local fallback.
#[derive(Clone)]
pub struct RewriteEngine {
    primary: Option<Arc<dyn Rewriter>>,
    fallback: LocalRewriter,
}

impl RewriteEngine {
    pub fn new(primary: Option<Arc<dyn Rewriter>>, fallback: LocalRewriter) -> Self {
        Self { primary, fallback }
    }

    /// Local rules only.
    pub fn local(strategy: RewriteStrategy) -> Self {
        Self::new(None, LocalRewriter::new(strategy))
    }

    pub fn from_config(config: &Config) -> Result<Self, RewriteError> {
        let fallback = LocalRewriter::new(config.rewrite_strategy);
        let primary = match &config.ai {
            Some(ai) => {
                tracing::info!("🤖 AI rewrites enabled (model {})", ai.model);
                Some(Arc::new(RemoteRewriter::new(ai.clone())?) as Arc<dyn Rewriter>)
            }
            None => {
                tracing::info!("AI rewrites disabled: OPENAI_API_KEY not set, using local rules");
                None
            }
        };
        Ok(Self::new(primary, fallback))
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Always returns a result with at least one change entry.
    pub async fn improve(&self, text: &str) -> RewriteResult {
        if text.trim().is_empty() {
            return RewriteResult::new(
                text,
                text.to_string(),
                vec![Change::new("No changes", "There was no text to adjust")],
                RewriteMethod::NoChange,
                0.0,
                "Nothing to rewrite.",
            );
        }

        if let Some(primary) = &self.primary {
            match primary.rewrite(text).await {
                Ok(result) if !result.changes.is_empty() => return result,
                Ok(_) => {
                    tracing::warn!("⚠️ {} rewriter returned no changes, using local rules", primary.name());
                }
                Err(e) => {
                    tracing::warn!("⚠️ {} rewrite failed, using local rules: {}", primary.name(), e);
                }
            }
        }

        self.fallback.rewrite_text(text)
    }
}
