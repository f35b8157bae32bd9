use anyhow::{Context, Result};

use crate::error::DigestError;

pub const DEFAULT_SUMMARY_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_LANGUAGE: &str = "en";

/// Application configuration loaded once at startup and handed to each
/// component. Credentials are optional here; a component with a missing
/// credential reports a configuration error when it is called.
#[derive(Clone)]
pub struct AppConfig {
    // Query generation (OpenAI, fine-tuned model)
    pub openai_api_key: Option<String>,
    pub query_model: Option<String>,
    pub openai_base_url: Option<String>,

    // Scholarly search (SerpAPI)
    pub serpapi_api_key: Option<String>,
    pub scholar_base_url: Option<String>,
    pub search_page_size: u32,
    pub search_language: String,

    // Summarization (Anthropic)
    pub anthropic_api_key: Option<String>,
    pub summary_model: String,
    pub anthropic_base_url: Option<String>,

    // Web server
    pub api_host: String,
    pub api_port: u16,
}

impl AppConfig {
    /// Load from the process environment, honouring a local `.env` file.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            query_model: get("OPENAI_QUERY_MODEL"),
            openai_base_url: get("OPENAI_BASE_URL"),
            serpapi_api_key: get("SERPAPI_API_KEY"),
            scholar_base_url: get("SCHOLAR_BASE_URL"),
            search_page_size: match get("SEARCH_PAGE_SIZE") {
                Some(v) => v.parse().context("SEARCH_PAGE_SIZE must be a number")?,
                None => DEFAULT_PAGE_SIZE,
            },
            search_language: get("SEARCH_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            summary_model: get("ANTHROPIC_SUMMARY_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            anthropic_base_url: get("ANTHROPIC_BASE_URL"),
            api_host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: match get("API_PORT") {
                Some(v) => v.parse().context("API_PORT must be a number")?,
                None => 3000,
            },
        })
    }

    pub fn require_openai_api_key(&self) -> Result<&str, DigestError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| DigestError::missing_setting("OPENAI_API_KEY"))
    }

    pub fn require_query_model(&self) -> Result<&str, DigestError> {
        self.query_model
            .as_deref()
            .ok_or_else(|| DigestError::missing_setting("OPENAI_QUERY_MODEL"))
    }

    pub fn require_serpapi_api_key(&self) -> Result<&str, DigestError> {
        self.serpapi_api_key
            .as_deref()
            .ok_or_else(|| DigestError::missing_setting("SERPAPI_API_KEY"))
    }

    pub fn require_anthropic_api_key(&self) -> Result<&str, DigestError> {
        self.anthropic_api_key
            .as_deref()
            .ok_or_else(|| DigestError::missing_setting("ANTHROPIC_API_KEY"))
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let head = ai_client::truncate_to_char_boundary(val, 5);
            format!("{}...({} chars)", head, val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => preview(v),
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  OPENAI_API_KEY: {}", preview_opt(&self.openai_api_key));
        tracing::info!(
            "  OPENAI_QUERY_MODEL: {}",
            self.query_model.as_deref().unwrap_or("<not set>")
        );
        tracing::info!("  SERPAPI_API_KEY: {}", preview_opt(&self.serpapi_api_key));
        tracing::info!("  ANTHROPIC_API_KEY: {}", preview_opt(&self.anthropic_api_key));
        tracing::info!("  ANTHROPIC_SUMMARY_MODEL: {}", self.summary_model);
        tracing::info!(
            "  SEARCH: page_size={} language={}",
            self.search_page_size,
            self.search_language
        );
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redacted(val: &Option<String>) -> &'static str {
            if val.is_some() {
                "<redacted>"
            } else {
                "<not set>"
            }
        }

        f.debug_struct("AppConfig")
            .field("openai_api_key", &redacted(&self.openai_api_key))
            .field("query_model", &self.query_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("serpapi_api_key", &redacted(&self.serpapi_api_key))
            .field("scholar_base_url", &self.scholar_base_url)
            .field("search_page_size", &self.search_page_size)
            .field("search_language", &self.search_language)
            .field("anthropic_api_key", &redacted(&self.anthropic_api_key))
            .field("summary_model", &self.summary_model)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("api_host", &self.api_host)
            .field("api_port", &self.api_port)
            .finish()
    }
}
