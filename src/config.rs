//! Runtime configuration loaded from the environment (and `.env` via dotenv).
//!
//! Every key has a default; values that fail to parse fall back to it.

use std::time::Duration;

/// Hard ceiling for the remote rewrite call.
pub const MAX_AI_TIMEOUT: Duration = Duration::from_secs(10);

/// Which local rule tables the rewrite engine consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteStrategy {
    /// Harsh-word softening plus the acknowledgment fallback
    #[default]
    Minimal,
    /// Sentence patterns first, then the minimal path
    Pattern,
}

impl RewriteStrategy {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pattern" | "patterns" => RewriteStrategy::Pattern,
            _ => RewriteStrategy::Minimal,
        }
    }
}

/// Settings for the OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Longest accepted input, in characters
    pub max_text_chars: usize,
    /// Idle lifetime of a session
    pub session_ttl: Duration,
    pub rewrite_strategy: RewriteStrategy,
    /// `None` disables the AI rewrite path
    pub ai: Option<AiConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_text_chars: 5000,
            session_ttl: Duration::from_secs(7200),
            rewrite_strategy: RewriteStrategy::Minimal,
            ai: None,
        }
    }
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let ai = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|api_key| {
                let timeout = parsed("AI_TIMEOUT_SECS")
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(MAX_AI_TIMEOUT)
                    .min(MAX_AI_TIMEOUT);

                AiConfig {
                    api_key,
                    base_url: lookup("OPENAI_BASE_URL")
                        .map(|u| u.trim().trim_end_matches('/').to_string())
                        .filter(|u| !u.is_empty())
                        .unwrap_or_else(|| "https://api.openai.com".to_string()),
                    model: lookup("OPENAI_MODEL")
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| "gpt-4o-mini".to_string()),
                    max_tokens: parsed("AI_MAX_TOKENS")
                        .and_then(|n| u32::try_from(n).ok())
                        .unwrap_or(150),
                    temperature: lookup("AI_TEMPERATURE")
                        .and_then(|s| s.trim().parse::<f32>().ok())
                        .filter(|t| (0.0..=2.0).contains(t))
                        .unwrap_or(0.3),
                    timeout,
                }
            });

        Self {
            host: lookup("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parsed("PORT")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(defaults.port),
            max_text_chars: parsed("MAX_TEXT_CHARS")
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .unwrap_or(defaults.max_text_chars),
            session_ttl: parsed("SESSION_TTL_SECS")
                .filter(|n| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            rewrite_strategy: lookup("REWRITE_STRATEGY")
                .map(|s| RewriteStrategy::parse(&s))
                .unwrap_or_default(),
            ai,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai.is_some()
    }
}
