use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::{ChatModel, Prompt};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The Messages API requires a limit on every request.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic Messages API client bound to one model.
#[derive(Clone)]
pub struct Claude {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn request<'a>(&'a self, prompt: &'a Prompt) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: prompt.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: prompt.system.as_deref(),
            temperature: prompt.temperature,
            messages: [UserTurn {
                role: "user",
                content: &prompt.user,
            }],
        }
    }

    async fn post(&self, prompt: &Prompt) -> Result<reqwest::Response> {
        let url = format!("{}/messages", self.base_url);
        debug!(model = %self.model, "Claude messages request");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(anyhow!("Claude API error ({status}): {body}"));
        }
        Ok(response)
    }
}

impl std::fmt::Debug for Claude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Claude")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl ChatModel for Claude {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let reply: MessagesResponse = self.post(prompt).await?.json().await?;
        Ok(reply
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .unwrap_or_default())
    }

    async fn complete_raw(&self, prompt: &Prompt) -> Result<serde_json::Value> {
        Ok(self.post(prompt).await?.json().await?)
    }
}

// --- Wire format ---

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: [UserTurn<'a>; 1],
}

#[derive(Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
