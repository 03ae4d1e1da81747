//! Remote tone rewrites through an OpenAI-compatible chat completion API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{AiConfig, MAX_AI_TIMEOUT};
use crate::rewrite::{Change, RewriteError, RewriteMethod, RewriteResult, Rewriter};
use crate::sentiment;

pub const SYSTEM_PROMPT: &str = "You are a careful editor. Preserve the exact meaning of the \
user's comment and soften only its tone. Make the minimal edits needed. Respond with only the \
rewritten text.";

const AI_EXPLANATION: &str =
    "Rewritten by a language model with minimal edits to soften the tone while keeping the meaning.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct RemoteRewriter {
    client: reqwest::Client,
    config: AiConfig,
}

impl RemoteRewriter {
    pub fn new(config: AiConfig) -> Result<Self, RewriteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout.min(MAX_AI_TIMEOUT))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    /// Single chat completion round trip; returns the cleaned rewrite.
    async fn complete(&self, text: &str) -> Result<String, RewriteError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Rewrite this comment with a gentler tone: {}", text),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RewriteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RewriteError::Malformed("missing choices[0].message.content".into()))?;

        let cleaned = strip_wrapping_quotes(&content);
        if cleaned.is_empty() {
            return Err(RewriteError::EmptyCompletion);
        }
        Ok(cleaned.to_string())
    }
}

#[async_trait]
impl Rewriter for RemoteRewriter {
    fn name(&self) -> &'static str {
        "ai"
    }

    async fn rewrite(&self, text: &str) -> Result<RewriteResult, RewriteError> {
        let original = sentiment::score(text);
        let improved = self.complete(text).await?;

        let change = if improved != text.trim() {
            Change::new(
                "AI tone refinement",
                "Softened the wording while keeping the original meaning",
            )
        } else {
            Change::new(
                "AI review",
                "The comment already reads respectfully; no edits were needed",
            )
        };

        tracing::info!(
            "🤖 AI rewrite complete ({} → {} chars)",
            original.char_count,
            improved.chars().count()
        );

        Ok(RewriteResult::new(
            text,
            improved,
            vec![change],
            RewriteMethod::AIEnhanced,
            original.polarity,
            AI_EXPLANATION,
        ))
    }
}

/// Trims and removes one layer of quotes when they wrap the whole text.
/// Text that merely starts and ends with quoted parts is left alone.
pub fn strip_wrapping_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if trimmed.chars().count() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
            let inner = &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
            if has_unescaped(inner, open) || has_unescaped(inner, close) {
                return trimmed;
            }
            return inner.trim();
        }
    }
    trimmed
}

fn has_unescaped(text: &str, quote: char) -> bool {
    let mut escaped = false;
    for c in text.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return true;
        }
    }
    false
}
