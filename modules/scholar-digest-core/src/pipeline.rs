use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::chooser::{choose, Chooser, RandomChooser};
use crate::error::DigestError;
use crate::query_generator::QueryGenerator;
use crate::search_provider::SearchProvider;
use crate::summarizer::Summarizer;
use crate::types::{ArticleView, Interests};

const NO_SUMMARY: &str = "No summary available.";

/// How a pipeline run ended. Serialized with a `status` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Success {
        article: ArticleView,
    },
    NoQueries {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<DigestError>,
    },
    NoResults {
        message: String,
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<DigestError>,
    },
    MalformedResults {
        message: String,
        query: String,
    },
    SelectionError {
        message: String,
        query: String,
    },
    SummarizeFailed {
        message: String,
        query: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<DigestError>,
    },
    GenericError {
        message: String,
    },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success { .. })
    }

    fn generic() -> Self {
        PipelineOutcome::GenericError {
            message: "Something went wrong while preparing your article. Please try again."
                .to_string(),
        }
    }
}

/// interests -> queries -> search -> pick -> summarize -> article.
#[derive(Clone)]
pub struct Pipeline {
    queries: Arc<dyn QueryGenerator>,
    search: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn Summarizer>,
    chooser: Arc<dyn Chooser>,
}

impl Pipeline {
    pub fn new(
        queries: Arc<dyn QueryGenerator>,
        search: Arc<dyn SearchProvider>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            queries,
            search,
            summarizer,
            chooser: Arc::new(RandomChooser),
        }
    }

    pub fn with_chooser(mut self, chooser: Arc<dyn Chooser>) -> Self {
        self.chooser = chooser;
        self
    }

    /// Runs every stage in order. A panic anywhere becomes `GenericError`.
    pub async fn run(&self, interests: &Interests) -> PipelineOutcome {
        match AssertUnwindSafe(self.run_stages(interests))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(detail = %detail, "Pipeline panicked");
                PipelineOutcome::generic()
            }
        }
    }

    async fn run_stages(&self, interests: &Interests) -> PipelineOutcome {
        info!(interests = %interests.join(", "), "Pipeline started");

        // Query stage
        let generated = self.queries.generate_queries(interests).await;
        if generated.queries.is_empty() {
            warn!(error = ?generated.error, "Pipeline halted: no queries");
            return PipelineOutcome::NoQueries {
                message: "We couldn't come up with search queries for those interests. Try different ones.".to_string(),
                error: generated.error,
            };
        }

        let Some(picked) = choose(self.chooser.as_ref(), &generated.queries) else {
            return PipelineOutcome::generic();
        };
        let query = strip_emphasis(picked);
        info!(query = %query, "Selected query");

        // Search stage
        let response = self.search.search(&query, 0).await;
        let searched = response.query().to_string();
        match &response.error {
            Some(DigestError::UpstreamMalformed(detail)) => {
                warn!(query = %searched, detail = %detail, "Pipeline halted: malformed results");
                return PipelineOutcome::MalformedResults {
                    message: "The search service sent back results we couldn't read.".to_string(),
                    query: searched,
                };
            }
            Some(e) if response.results.is_empty() => {
                warn!(query = %searched, error = %e, "Pipeline halted: search failed");
                return PipelineOutcome::NoResults {
                    message: format!("No articles found for \"{searched}\"."),
                    query: searched,
                    error: Some(e.clone()),
                };
            }
            _ => {}
        }
        if response.results.is_empty() {
            warn!(query = %searched, "Pipeline halted: no results");
            return PipelineOutcome::NoResults {
                message: format!("No articles found for \"{searched}\"."),
                query: searched,
                error: None,
            };
        }

        // Result selection
        let Some(result) = choose(self.chooser.as_ref(), &response.results) else {
            return PipelineOutcome::generic();
        };
        let original_title = result.title.trim().to_string();
        if original_title.is_empty() {
            warn!(query = %searched, id = %result.id, "Pipeline halted: selected result has no title");
            return PipelineOutcome::SelectionError {
                message: "The article we picked was missing its title.".to_string(),
                query: searched,
            };
        }
        info!(id = %result.id, title = %original_title, "Selected result");

        // Summarize stage
        let text = format!(
            "title: {}\n{}",
            original_title,
            result.snippet.as_deref().unwrap_or("")
        );
        let summary = self.summarizer.summarize(&text).await;
        if let Some(e) = summary.error {
            warn!(title = %original_title, error = %e, "Pipeline halted: summarize failed");
            return PipelineOutcome::SummarizeFailed {
                message: "We found an article but couldn't summarize it.".to_string(),
                query: searched,
                error: Some(e),
            };
        }

        let title = non_empty(summary.title).unwrap_or_else(|| original_title.clone());
        let summary = non_empty(summary.summary).unwrap_or_else(|| NO_SUMMARY.to_string());

        info!(title = %title, "Pipeline complete");
        PipelineOutcome::Success {
            article: ArticleView {
                title,
                summary,
                link: result.title_link.clone(),
                original_title: Some(original_title),
            },
        }
    }
}

/// Removes markdown emphasis characters the generator sometimes leaves in.
pub fn strip_emphasis(query: &str) -> String {
    query
        .chars()
        .filter(|c| !matches!(c, '*' | '`'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
