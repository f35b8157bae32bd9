use anyhow::Result;
use async_trait::async_trait;

/// One system instruction plus one user turn, with sampling settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Prompt {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A hosted chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model(&self) -> &str;

    /// First text block of the reply; empty when the provider sent none.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;

    /// Reply body as received. For callers that must cope with several
    /// response shapes themselves.
    async fn complete_raw(&self, prompt: &Prompt) -> Result<serde_json::Value>;
}
