use std::sync::LazyLock;

use ai_client::{strip_code_blocks, ChatModel, OpenAi, Prompt};
use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::DigestError;
use crate::types::{GeneratedQueries, Interests};

/// How many queries the model is asked for.
pub const QUERY_COUNT: usize = 5;
const QUERY_TEMPERATURE: f32 = 0.3;
const QUERY_MAX_TOKENS: u32 = 512;

const SYSTEM_PROMPT: &str = "You turn a reader's interests into search queries for an \
academic search engine. Queries should be short, use the vocabulary found in paper titles \
and abstracts, and favour recent peer-reviewed work.";

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+[.)]\s+(.+?)\s*$").unwrap());

/// Turns interests into candidate scholarly search queries.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Never fails: problems come back as an empty list plus `error`.
    async fn generate_queries(&self, interests: &Interests) -> GeneratedQueries;
}

/// Query generator backed by a fine-tuned OpenAI chat model.
pub struct OpenAiQueryGenerator {
    agent: Result<OpenAi, DigestError>,
}

impl OpenAiQueryGenerator {
    pub fn new(agent: OpenAi) -> Self {
        Self { agent: Ok(agent) }
    }

    /// Missing credentials are held and reported on every call.
    pub fn from_config(config: &AppConfig) -> Self {
        let agent = config.require_openai_api_key().and_then(|key| {
            let model = config.require_query_model()?;
            let agent = OpenAi::new(key, model);
            Ok(match &config.openai_base_url {
                Some(url) => agent.with_base_url(url.clone()),
                None => agent,
            })
        });
        Self { agent }
    }
}

pub fn build_prompt(interests: &Interests) -> String {
    format!(
        "Generate exactly {QUERY_COUNT} scholarly search queries for someone interested in: {}.\n\
         Return them as a numbered list, one query per line, with no commentary.",
        interests.join(", ")
    )
}

#[async_trait]
impl QueryGenerator for OpenAiQueryGenerator {
    async fn generate_queries(&self, interests: &Interests) -> GeneratedQueries {
        let agent = match &self.agent {
            Ok(agent) => agent,
            Err(e) => {
                warn!(error = %e, "Query generator is not configured");
                return GeneratedQueries::failed(e.clone());
            }
        };

        info!(interests = %interests.join(", "), model = agent.model(), "Generating queries");

        let prompt = Prompt::new(build_prompt(interests))
            .system(SYSTEM_PROMPT)
            .temperature(QUERY_TEMPERATURE)
            .max_tokens(QUERY_MAX_TOKENS);
        let response = agent.complete(&prompt).await;

        let raw = match response {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Query generation request failed");
                return GeneratedQueries::failed(e.into());
            }
        };

        match parse_queries(&raw) {
            Ok(queries) => {
                info!(count = queries.len(), "Generated queries");
                GeneratedQueries {
                    queries,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Query generator returned no usable text");
                GeneratedQueries::failed(e)
            }
        }
    }
}

/// Pulls queries out of free-form model output.
///
/// Tries a numbered list first, then one query per line (skipping chatty
/// lead-ins such as "Here are..."), then the whole text as a single query.
pub fn parse_queries(raw: &str) -> Result<Vec<String>, DigestError> {
    let text = strip_code_blocks(raw);
    if text.is_empty() {
        return Err(DigestError::UpstreamEmpty(
            "query generator returned empty text".to_string(),
        ));
    }

    let numbered: Vec<String> = NUMBERED_ITEM
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| clean_query(m.as_str()))
        .filter(|q| !q.is_empty())
        .collect();
    if !numbered.is_empty() {
        return Ok(numbered);
    }

    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !is_filler(line))
        .map(clean_query)
        .filter(|q| !q.is_empty())
        .collect();
    if !lines.is_empty() {
        return Ok(lines);
    }

    warn!("Query output had no list structure, using it verbatim");
    Ok(vec![text.trim().to_string()])
}

fn is_filler(line: &str) -> bool {
    line.starts_with("Here") || line.starts_with("Based")
}

fn clean_query(q: &str) -> String {
    q.trim()
        .trim_start_matches(['-', '*', '•'])
        .trim()
        .to_string()
}
