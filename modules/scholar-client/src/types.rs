use serde::{Deserialize, Serialize};

/// Query parameters for the `google_scholar` engine, minus the API key.
#[derive(Debug, Clone, Serialize)]
pub struct ScholarSearchInput {
    pub q: String,
    /// Zero-based result offset.
    pub start: u32,
    pub num: u32,
    pub hl: String,
}

/// Raw search response. `organic_results` stays untyped so callers can tell
/// "missing", "empty" and "not a list" apart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScholarSearchResponse {
    pub search_metadata: Option<SearchMetadata>,
    pub search_information: Option<SearchInformation>,
    pub organic_results: Option<serde_json::Value>,
    /// Body-level error message. The provider reports "no results" this way too.
    pub error: Option<String>,
}

impl ScholarSearchResponse {
    /// True when the provider explicitly said the query matched nothing.
    pub fn is_fully_empty(&self) -> bool {
        let state_empty = self
            .search_information
            .as_ref()
            .and_then(|info| info.organic_results_state.as_deref())
            .is_some_and(|state| state.eq_ignore_ascii_case("fully empty"));
        let error_empty = self
            .error
            .as_deref()
            .is_some_and(|e| e.contains("hasn't returned any results"));
        state_empty || error_empty
    }

    pub fn total_results(&self) -> Option<u64> {
        self.search_information
            .as_ref()
            .and_then(|info| info.total_results)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMetadata {
    pub id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchInformation {
    pub organic_results_state: Option<String>,
    pub total_results: Option<u64>,
    pub query_displayed: Option<String>,
}

/// One entry of `organic_results`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganicResult {
    pub position: Option<u32>,
    pub title: Option<String>,
    pub result_id: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub publication_info: Option<PublicationInfo>,
    pub inline_links: Option<InlineLinks>,
    pub resources: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicationInfo {
    /// e.g. "J Smith, A Doe - Nature, 2021 - nature.com"
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineLinks {
    pub cited_by: Option<CitedBy>,
    pub related_pages_link: Option<String>,
    pub versions: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CitedBy {
    pub total: Option<u64>,
    pub link: Option<String>,
}
