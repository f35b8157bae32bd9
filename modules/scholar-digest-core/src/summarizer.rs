use ai_client::{truncate_chars, ChatModel, Claude, Prompt};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::DigestError;
use crate::types::SummaryResult;

pub const DEFAULT_TITLE: &str = "Scholarly Article";
/// Content is cut to this many characters before it is sent.
pub const MAX_CONTENT_CHARS: usize = 8000;
const SUMMARY_TEMPERATURE: f32 = 1.0;
const SUMMARY_MAX_TOKENS: u32 = 2048;

const SYSTEM_PROMPT: &str = "You explain research to curious non-specialists. Summarize the \
material you are given in plain, formal but simple language, in a short paragraph. State \
the finding as a standalone fact about the world; never refer to \"this article\", \"this \
paper\" or \"the authors\". Do not use markdown.";

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Never fails and never returns an empty title or summary.
    async fn summarize(&self, article_text: &str) -> SummaryResult;
}

/// Summarizer backed by the Anthropic Messages API.
pub struct ClaudeSummarizer {
    agent: Result<Claude, DigestError>,
}

impl ClaudeSummarizer {
    pub fn new(agent: Claude) -> Self {
        Self { agent: Ok(agent) }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let agent = config.require_anthropic_api_key().map(|key| {
            let agent = Claude::new(key, config.summary_model.clone());
            match &config.anthropic_base_url {
                Some(url) => agent.with_base_url(url.clone()),
                None => agent,
            }
        });
        Self { agent }
    }
}

#[async_trait]
impl Summarizer for ClaudeSummarizer {
    async fn summarize(&self, article_text: &str) -> SummaryResult {
        let agent = match &self.agent {
            Ok(agent) => agent,
            Err(e) => {
                warn!(error = %e, "Summarizer is not configured");
                return SummaryResult::failed(e.clone());
            }
        };

        let (title, body) = extract_title(article_text);
        let content = prepare_content(&body);
        info!(title = %title, chars = content.chars().count(), "Summarizing article");

        let prompt = Prompt::new(format!("Title: {title}\n\n{content}"))
            .system(SYSTEM_PROMPT)
            .temperature(SUMMARY_TEMPERATURE)
            .max_tokens(SUMMARY_MAX_TOKENS);
        let raw = agent.complete_raw(&prompt).await;

        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Summarization request failed");
                return SummaryResult::failed(e.into());
            }
        };

        let summary = match extract_summary(&raw) {
            Some(text) if !looks_like_raw_object(&text) => text,
            Some(_) => {
                warn!(title = %title, "Summary echoed structured data, using default");
                default_summary(&title)
            }
            None => {
                warn!(title = %title, "No summary text in response, using default");
                default_summary(&title)
            }
        };

        SummaryResult {
            title,
            summary,
            error: None,
        }
    }
}

// =============================================================================
// Input shaping
// =============================================================================

/// Splits a `title:` line off the text. The marker is matched
/// case-insensitively anywhere in the text; everything after it up to the
/// line break is the title, and that whole line is removed from the body.
pub fn extract_title(text: &str) -> (String, String) {
    let lower = text.to_ascii_lowercase();
    let Some(marker) = lower.find("title:") else {
        return (DEFAULT_TITLE.to_string(), text.trim().to_string());
    };

    let after = &text[marker + "title:".len()..];
    let line_end = after.find('\n').map(|i| marker + "title:".len() + i);
    let title = match line_end {
        Some(end) => &text[marker + "title:".len()..end],
        None => after,
    }
    .trim();

    let line_start = text[..marker].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let mut body = String::with_capacity(text.len());
    body.push_str(&text[..line_start]);
    if let Some(end) = line_end {
        body.push_str(&text[end + 1..]);
    }

    let title = if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title.to_string()
    };
    (title, body.trim().to_string())
}

pub fn prepare_content(body: &str) -> String {
    match truncate_chars(body, MAX_CONTENT_CHARS) {
        (head, true) => format!("{head}..."),
        (whole, false) => whole.to_string(),
    }
}

pub fn default_summary(title: &str) -> String {
    format!(
        "The article discusses {title}. Unfortunately, not enough context was available to generate a detailed summary."
    )
}

// =============================================================================
// Response extraction
// =============================================================================

type Extractor = fn(&Value) -> Option<String>;

/// Tried in order; the first non-empty text wins.
const EXTRACTORS: &[(&str, Extractor)] = &[
    ("top_level_text", top_level_text),
    ("content_blocks", content_blocks),
    ("choices", choices),
];

pub fn extract_summary(raw: &Value) -> Option<String> {
    EXTRACTORS.iter().find_map(|(name, extract)| {
        let text = extract(raw)?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        tracing::debug!(extractor = *name, "Summary text extracted");
        Some(text.to_string())
    })
}

fn top_level_text(raw: &Value) -> Option<String> {
    ["completion", "text"]
        .iter()
        .find_map(|key| raw.get(key)?.as_str().map(str::to_string))
}

fn content_blocks(raw: &Value) -> Option<String> {
    let blocks = raw.get("content")?.as_array()?;
    let text: Vec<&str> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text")?.as_str())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text.join("\n"))
    }
}

fn choices(raw: &Value) -> Option<String> {
    let first = raw.get("choices")?.get(0)?;
    first
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .or_else(|| first.get("text").and_then(Value::as_str))
        .map(str::to_string)
}

/// True for text that is an untouched structured value rather than prose.
pub fn looks_like_raw_object(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed == "[object Object]" {
        return true;
    }
    trimmed.starts_with('{')
        && serde_json::from_str::<Value>(trimmed).is_ok_and(|v| v.is_object())
}
