use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DigestError;

// =============================================================================
// Interests
// =============================================================================

/// A non-empty, deduplicated set of interest tags in the order the user gave them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Interests(Vec<String>);

impl Interests {
    /// Trims entries, drops blanks and removes case-insensitive duplicates
    /// (first occurrence wins). Fails when nothing is left.
    pub fn new<I, S>(raw: I) -> Result<Self, DigestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut interests = Vec::new();
        for item in raw {
            let trimmed = item.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen.insert(trimmed.to_lowercase()) {
                interests.push(trimmed.to_string());
            }
        }

        if interests.is_empty() {
            return Err(DigestError::Validation(
                "interests must contain at least one non-empty entry".to_string(),
            ));
        }
        Ok(Self(interests))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

// =============================================================================
// Stage payloads
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedQueries {
    pub queries: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DigestError>,
}

impl GeneratedQueries {
    pub fn failed(error: DigestError) -> Self {
        Self {
            queries: Vec::new(),
            error: Some(error),
        }
    }
}

/// One scholarly search hit. Provider extras (citation counts, related pages,
/// versions) ride along untouched in `metadata`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displayed_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDetails {
    pub query: String,
    pub results_count: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub search_details: SearchDetails,
    pub results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DigestError>,
}

impl SearchResponse {
    /// The synthetic zero-result response returned whenever a search fails.
    pub fn failed(query: impl Into<String>, error: DigestError) -> Self {
        Self {
            search_details: SearchDetails {
                query: query.into(),
                results_count: "0 results".to_string(),
            },
            results: Vec::new(),
            error: Some(error),
        }
    }

    pub fn query(&self) -> &str {
        &self.search_details.query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DigestError>,
}

pub const SUMMARY_ERROR_TITLE: &str = "Error Summarizing Article";
pub const SUMMARY_ERROR_TEXT: &str =
    "We couldn't summarize this article right now. Please try again in a moment.";

impl SummaryResult {
    pub fn failed(error: DigestError) -> Self {
        Self {
            title: SUMMARY_ERROR_TITLE.to_string(),
            summary: SUMMARY_ERROR_TEXT.to_string(),
            error: Some(error),
        }
    }
}

/// What the presentation layer renders for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
}
