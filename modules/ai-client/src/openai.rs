use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompt::{ChatModel, Prompt};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat completions client bound to one model (base or fine-tuned).
#[derive(Clone)]
pub struct OpenAi {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAi {
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

    fn request<'a>(&'a self, prompt: &'a Prompt) -> CompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = prompt.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user,
        });

        // Reasoning models reject `max_tokens`.
        let (max_tokens, max_completion_tokens) = if uses_max_completion_tokens(&self.model) {
            (None, prompt.max_tokens)
        } else {
            (prompt.max_tokens, None)
        };

        CompletionRequest {
            model: &self.model,
            messages,
            temperature: prompt.temperature,
            max_tokens,
            max_completion_tokens,
        }
    }

    async fn post(&self, prompt: &Prompt) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, "OpenAI chat request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(anyhow!("OpenAI API error ({status}): {body}"));
        }
        Ok(response)
    }
}

impl std::fmt::Debug for OpenAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAi")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl ChatModel for OpenAi {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let reply: CompletionResponse = self.post(prompt).await?.json().await?;
        Ok(reply
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn complete_raw(&self, prompt: &Prompt) -> Result<serde_json::Value> {
        Ok(self.post(prompt).await?.json().await?)
    }
}

fn uses_max_completion_tokens(model: &str) -> bool {
    let base = model.strip_prefix("ft:").unwrap_or(model);
    base.starts_with("o1") || base.starts_with("o3") || base.starts_with("gpt-5")
}

// --- Wire format ---

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}
