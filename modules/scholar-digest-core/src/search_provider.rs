use async_trait::async_trait;
use scholar_client::{OrganicResult, ScholarClient, ScholarSearchInput, ScholarSearchResponse};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::DigestError;
use crate::types::{Interests, SearchDetails, SearchResponse, SearchResult};

/// Keywords kept when broadening a query that found nothing.
const BROADEN_KEYWORDS: usize = 3;

/// Scholarly search over a single query string.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Never fails: problems come back as an empty result list plus `error`.
    async fn search(&self, query: &str, page: u32) -> SearchResponse;

    async fn search_by_interests(&self, interests: &Interests, page: u32) -> SearchResponse {
        self.search(&interests.join(" "), page).await
    }

    async fn search_with_advanced_query(&self, interests: &Interests, page: u32) -> SearchResponse {
        self.search(&build_advanced_query(interests.as_slice()), page)
            .await
    }
}

// =============================================================================
// Query shaping
// =============================================================================

/// `a` / `a AND b` / `(a AND b) AND (c OR d ...)`.
pub fn build_advanced_query(interests: &[String]) -> String {
    match interests {
        [] => String::new(),
        [only] => only.clone(),
        [a, b] => format!("{a} AND {b}"),
        [a, b, rest @ ..] => format!("({a} AND {b}) AND ({})", rest.join(" OR ")),
    }
}

/// Up to three long-ish keywords from `query`, or `None` when that would not
/// change anything.
pub fn broaden_query(query: &str) -> Option<String> {
    let stripped: String = query
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '“' | '”'))
        .collect();
    let broadened = stripped
        .split_whitespace()
        .filter(|token| token.chars().count() > 3)
        .take(BROADEN_KEYWORDS)
        .collect::<Vec<_>>()
        .join(" ");

    if broadened.is_empty() || broadened == query {
        None
    } else {
        Some(broadened)
    }
}

// =============================================================================
// SerpAPI-backed provider
// =============================================================================

pub struct ScholarSearchProvider {
    client: Result<ScholarClient, DigestError>,
    page_size: u32,
    language: String,
}

impl ScholarSearchProvider {
    pub fn new(client: ScholarClient, page_size: u32, language: impl Into<String>) -> Self {
        Self {
            client: Ok(client),
            page_size,
            language: language.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let client = config.require_serpapi_api_key().map(|key| {
            let client = ScholarClient::new(key.to_string());
            match &config.scholar_base_url {
                Some(url) => client.with_base_url(url.clone()),
                None => client,
            }
        });
        Self {
            client,
            page_size: config.search_page_size,
            language: config.search_language.clone(),
        }
    }

    /// One request, no fallback.
    async fn search_once(&self, query: &str, page: u32) -> SearchResponse {
        let client = match &self.client {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Search provider is not configured");
                return SearchResponse::failed(query, e.clone());
            }
        };

        let input = ScholarSearchInput {
            q: query.to_string(),
            start: page.saturating_mul(self.page_size),
            num: self.page_size,
            hl: self.language.clone(),
        };

        match client.search(&input).await {
            Ok(resp) => map_response(query, page, resp),
            Err(e) => {
                warn!(query, error = %e, "Scholar search failed");
                SearchResponse::failed(query, e.into())
            }
        }
    }
}

#[async_trait]
impl SearchProvider for ScholarSearchProvider {
    async fn search(&self, query: &str, page: u32) -> SearchResponse {
        info!(query, page, "Searching scholarly index");

        let first = self.search_once(query, page).await;
        if first.error.is_some() || !first.results.is_empty() {
            info!(query, count = first.results.len(), "Search complete");
            return first;
        }

        // Exactly one broadened attempt; its response is final.
        match broaden_query(query) {
            Some(broadened) => {
                warn!(query, broadened = %broadened, "No results, retrying with broadened query");
                let second = self.search_once(&broadened, page).await;
                info!(query = %broadened, count = second.results.len(), "Broadened search complete");
                second
            }
            None => {
                info!(query, "No results and nothing to broaden");
                first
            }
        }
    }
}

fn map_response(query: &str, page: u32, resp: ScholarSearchResponse) -> SearchResponse {
    let empty = |count: String| SearchResponse {
        search_details: SearchDetails {
            query: query.to_string(),
            results_count: count,
        },
        results: Vec::new(),
        error: None,
    };

    if resp.is_fully_empty() {
        return empty("0 results".to_string());
    }
    if let Some(message) = resp.error.as_deref() {
        return SearchResponse::failed(query, DigestError::Transport(message.to_string()));
    }

    let items = match resp.organic_results.as_ref() {
        None | Some(Value::Null) => return empty("0 results".to_string()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(query, kind = json_kind(other), "organic_results is not a list");
            return SearchResponse::failed(
                query,
                DigestError::UpstreamMalformed(format!(
                    "expected organic_results to be a list, got {}",
                    json_kind(other)
                )),
            );
        }
    };

    let results: Vec<SearchResult> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            match serde_json::from_value::<OrganicResult>(item.clone()) {
                Ok(organic) => Some(to_search_result(page, idx, organic)),
                Err(e) => {
                    warn!(query, index = idx, error = %e, "Skipping unparseable search result");
                    None
                }
            }
        })
        .collect();

    let results_count = match resp.total_results() {
        Some(total) => format!("About {total} results"),
        None => format!("{} results", results.len()),
    };

    SearchResponse {
        search_details: SearchDetails {
            query: query.to_string(),
            results_count,
        },
        results,
        error: None,
    }
}

fn to_search_result(page: u32, idx: usize, organic: OrganicResult) -> SearchResult {
    let position = organic.position.unwrap_or(idx as u32);

    let mut metadata = Map::new();
    metadata.insert("position".into(), Value::from(position));
    if let Some(links) = organic.inline_links {
        if let Some(cited_by) = links.cited_by {
            if let Some(total) = cited_by.total {
                metadata.insert("citedByCount".into(), Value::from(total));
            }
            if let Some(link) = cited_by.link {
                metadata.insert("citedByLink".into(), Value::from(link));
            }
        }
        if let Some(link) = links.related_pages_link {
            metadata.insert("relatedPagesLink".into(), Value::from(link));
        }
        if let Some(versions) = links.versions {
            metadata.insert("versions".into(), versions);
        }
    }
    if let Some(resources) = organic.resources {
        metadata.insert("resources".into(), resources);
    }

    SearchResult {
        id: organic
            .result_id
            .unwrap_or_else(|| format!("{page}-{position}")),
        title: organic.title.unwrap_or_default(),
        title_link: organic.link,
        displayed_link: organic.publication_info.and_then(|info| info.summary),
        snippet: organic.snippet,
        metadata,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_advanced_query_shapes() {
        assert_eq!(build_advanced_query(&strings(&["a"])), "a");
        assert_eq!(build_advanced_query(&strings(&["a", "b"])), "a AND b");
        assert_eq!(
            build_advanced_query(&strings(&["a", "b", "c"])),
            "(a AND b) AND (c)"
        );
        assert_eq!(
            build_advanced_query(&strings(&["a", "b", "c", "d"])),
            "(a AND b) AND (c OR d)"
        );
    }

    #[test]
    fn test_broaden_keeps_three_long_tokens() {
        assert_eq!(
            broaden_query("\"deep learning\" for the climate modelling community").as_deref(),
            Some("deep learning climate")
        );
    }

    #[test]
    fn test_broaden_none_when_no_token_qualifies() {
        assert_eq!(broaden_query("AI and ML"), None);
    }

    #[test]
    fn test_broaden_none_when_unchanged() {
        assert_eq!(broaden_query("ocean warming"), None);
    }

    fn response(body: Value) -> ScholarSearchResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_map_organic_results() {
        let resp = response(json!({
            "search_information": { "total_results": 1200 },
            "organic_results": [
                {
                    "position": 0,
                    "title": "Climate emulators",
                    "result_id": "r1",
                    "link": "https://example.org/1",
                    "snippet": "We train...",
                    "publication_info": { "summary": "J Doe - Nature, 2021" },
                    "inline_links": { "cited_by": { "total": 42, "link": "https://c" } }
                },
                { "position": 1, "snippet": "no title or id" }
            ]
        }));

        let mapped = map_response("q", 2, resp);
        assert!(mapped.error.is_none());
        assert_eq!(mapped.search_details.results_count, "About 1200 results");
        assert_eq!(mapped.results.len(), 2);

        let first = &mapped.results[0];
        assert_eq!(first.id, "r1");
        assert_eq!(first.title_link.as_deref(), Some("https://example.org/1"));
        assert_eq!(first.displayed_link.as_deref(), Some("J Doe - Nature, 2021"));
        assert_eq!(first.metadata["citedByCount"], 42);

        let second = &mapped.results[1];
        assert_eq!(second.id, "2-1");
        assert_eq!(second.title, "");
    }

    #[test]
    fn test_map_counts_results_without_total() {
        let resp = response(json!({ "organic_results": [{ "title": "x" }] }));
        let mapped = map_response("q", 0, resp);
        assert_eq!(mapped.search_details.results_count, "1 results");
    }

    #[test]
    fn test_map_non_list_is_malformed() {
        let resp = response(json!({ "organic_results": { "oops": true } }));
        let mapped = map_response("q", 0, resp);
        assert!(mapped.results.is_empty());
        assert!(matches!(mapped.error, Some(DigestError::UpstreamMalformed(_))));
    }

    #[test]
    fn test_map_no_results_message_is_empty_not_error() {
        let resp = response(json!({
            "error": "Google hasn't returned any results for this query."
        }));
        let mapped = map_response("q", 0, resp);
        assert!(mapped.results.is_empty());
        assert!(mapped.error.is_none());
    }

    #[test]
    fn test_map_other_body_error_is_transport() {
        let resp = response(json!({ "error": "Invalid API key." }));
        let mapped = map_response("q", 0, resp);
        assert!(matches!(mapped.error, Some(DigestError::Transport(_))));
    }

    #[tokio::test]
    async fn test_missing_key_reports_configuration_error() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let provider = ScholarSearchProvider::from_config(&config);
        let resp = provider.search("anything", 0).await;
        assert_eq!(resp.search_details.query, "anything");
        assert_eq!(resp.search_details.results_count, "0 results");
        assert!(matches!(resp.error, Some(DigestError::Configuration(_))));
    }
}
