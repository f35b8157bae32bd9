pub mod error;
pub mod types;

pub use error::{Result, ScholarError};
pub use types::{
    CitedBy, InlineLinks, OrganicResult, PublicationInfo, ScholarSearchInput,
    ScholarSearchResponse, SearchInformation, SearchMetadata,
};

const BASE_URL: &str = "https://serpapi.com";

/// SerpAPI engine name for Google Scholar.
const ENGINE: &str = "google_scholar";

pub struct ScholarClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ScholarClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run one Google Scholar search. A 200 response carrying a body-level
    /// `error` is returned as-is; callers decide whether it means "no results".
    pub async fn search(&self, input: &ScholarSearchInput) -> Result<ScholarSearchResponse> {
        tracing::debug!(query = %input.q, start = input.start, num = input.num, "Scholar search request");

        let url = format!("{}/search.json", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("engine", ENGINE), ("api_key", self.api_key.as_str())])
            .query(input)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            // SerpAPI answers empty searches with a 200, but some plans send
            // the same JSON error under a non-2xx status.
            if let Ok(parsed) = serde_json::from_str::<ScholarSearchResponse>(&body) {
                if parsed.is_fully_empty() {
                    return Ok(parsed);
                }
            }
            return Err(ScholarError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ScholarSearchResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            query = %input.q,
            total = ?parsed.total_results(),
            "Scholar search response received"
        );
        Ok(parsed)
    }
}
