use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scholar_digest_core::{Interests, QueryGenerator, SearchProvider, Summarizer};

use crate::AppState;

// --- Request bodies ---

#[derive(Deserialize)]
pub struct InterestsRequest {
    interests: Vec<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    query: Option<String>,
    page: Option<u32>,
}

#[derive(Deserialize)]
pub struct SearchInterestsRequest {
    interests: Vec<String>,
    page: Option<u32>,
    #[serde(default)]
    advanced: bool,
}

#[derive(Deserialize)]
pub struct SummarizeRequest {
    text: String,
}

// --- Helpers ---

fn bad_request(message: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message.to_string()})),
    )
        .into_response()
}

/// 500 with the component's full payload when it reported an error, else 200.
fn stage_response<T: Serialize>(failed: bool, body: T) -> Response {
    let status = if failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(body)).into_response()
}

fn parse_interests(raw: Vec<String>) -> Result<Interests, Response> {
    Interests::new(raw).map_err(|e| {
        warn!(error = %e, "Rejected interests");
        bad_request(e)
    })
}

// --- Handlers ---

pub async fn api_queries(
    State(state): State<Arc<AppState>>,
    body: Result<Json<InterestsRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return bad_request(format!("interests must be a non-empty array: {e}")),
    };
    let interests = match parse_interests(body.interests) {
        Ok(i) => i,
        Err(resp) => return resp,
    };

    let result = state.queries.generate_queries(&interests).await;
    stage_response(result.error.is_some(), result)
}

pub async fn api_search(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => return bad_request(e),
    };
    let query = match params.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return bad_request("query parameter is required"),
    };

    let resp = state.search.search(&query, params.page.unwrap_or(0)).await;
    stage_response(resp.error.is_some(), resp)
}

pub async fn api_search_interests(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SearchInterestsRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return bad_request(format!("interests must be a non-empty array: {e}")),
    };
    let interests = match parse_interests(body.interests) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let page = body.page.unwrap_or(0);

    let resp = if body.advanced {
        state.search.search_with_advanced_query(&interests, page).await
    } else {
        state.search.search_by_interests(&interests, page).await
    };
    stage_response(resp.error.is_some(), resp)
}

pub async fn api_summarize(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return bad_request(format!("text is required: {e}")),
    };
    if body.text.trim().is_empty() {
        return bad_request("text must not be empty");
    }

    let result = state.summarizer.summarize(&body.text).await;
    stage_response(result.error.is_some(), result)
}

pub async fn api_digest(
    State(state): State<Arc<AppState>>,
    body: Result<Json<InterestsRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return bad_request(format!("interests must be a non-empty array: {e}")),
    };
    let interests = match parse_interests(body.interests) {
        Ok(i) => i,
        Err(resp) => return resp,
    };

    let outcome = state.pipeline.run(&interests).await;
    info!(success = outcome.is_success(), "Digest served");
    Json(outcome).into_response()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use scholar_digest_core::{
        DigestError, GeneratedQueries, SearchDetails, SearchResponse, SearchResult,
        SummaryResult,
    };
    use serde_json::Value;

    use super::*;

    struct StubQueries;

    #[async_trait]
    impl QueryGenerator for StubQueries {
        async fn generate_queries(&self, interests: &Interests) -> GeneratedQueries {
            GeneratedQueries {
                queries: interests.iter().map(|i| format!("{i} review")).collect(),
                error: None,
            }
        }
    }

    /// Echoes the query back as a single result titled with it.
    struct EchoSearch;

    #[async_trait]
    impl SearchProvider for EchoSearch {
        async fn search(&self, query: &str, page: u32) -> SearchResponse {
            if query == "fail" {
                return SearchResponse::failed(query, DigestError::Transport("down".into()));
            }
            SearchResponse {
                search_details: SearchDetails {
                    query: query.to_string(),
                    results_count: "1 results".to_string(),
                },
                results: vec![SearchResult {
                    id: format!("{page}-0"),
                    title: query.to_string(),
                    title_link: Some("https://example.org/paper".to_string()),
                    ..Default::default()
                }],
                error: None,
            }
        }
    }

    struct StubSummarizer;

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, article_text: &str) -> SummaryResult {
            SummaryResult {
                title: "Stub".to_string(),
                summary: format!("{} chars", article_text.len()),
                error: None,
            }
        }
    }

    fn state() -> State<Arc<AppState>> {
        State(Arc::new(AppState::new(
            Arc::new(StubQueries),
            Arc::new(EchoSearch),
            Arc::new(StubSummarizer),
        )))
    }

    async fn body_json(resp: Response) -> (StatusCode, Value) {
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn interests(items: &[&str]) -> Result<Json<InterestsRequest>, JsonRejection> {
        Ok(Json(InterestsRequest {
            interests: items.iter().map(|s| s.to_string()).collect(),
        }))
    }

    #[tokio::test]
    async fn test_queries_ok() {
        let (status, body) = body_json(api_queries(state(), interests(&["AI", "ai", "oceans"])).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["queries"], serde_json::json!(["AI review", "oceans review"]));
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_queries_rejects_empty_interests() {
        let (status, body) = body_json(api_queries(state(), interests(&[" "])).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("interests"));
    }

    #[tokio::test]
    async fn test_search_get_requires_query() {
        let params = Ok(Query(SearchParams {
            query: Some("  ".into()),
            page: None,
        }));
        let (status, _) = body_json(api_search(state(), params).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_get_passes_page() {
        let params = Ok(Query(SearchParams {
            query: Some("coral".into()),
            page: Some(3),
        }));
        let (status, body) = body_json(api_search(state(), params).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["searchDetails"]["query"], "coral");
        assert_eq!(body["results"][0]["id"], "3-0");
    }

    #[tokio::test]
    async fn test_search_failure_is_500_with_full_shape() {
        let params = Ok(Query(SearchParams {
            query: Some("fail".into()),
            page: None,
        }));
        let (status, body) = body_json(api_search(state(), params).await).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["results"], serde_json::json!([]));
        assert_eq!(body["searchDetails"]["resultsCount"], "0 results");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_search_post_advanced() {
        let body = Ok(Json(SearchInterestsRequest {
            interests: vec!["a".into(), "b".into(), "c".into()],
            page: None,
            advanced: true,
        }));
        let (status, body) = body_json(api_search_interests(state(), body).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["searchDetails"]["query"], "(a AND b) AND (c)");
    }

    #[tokio::test]
    async fn test_search_post_plain_joins_interests() {
        let body = Ok(Json(SearchInterestsRequest {
            interests: vec!["a".into(), "b".into()],
            page: Some(1),
            advanced: false,
        }));
        let (_, body) = body_json(api_search_interests(state(), body).await).await;
        assert_eq!(body["searchDetails"]["query"], "a b");
    }

    #[tokio::test]
    async fn test_summarize_rejects_blank_text() {
        let body = Ok(Json(SummarizeRequest { text: "\n".into() }));
        let (status, _) = body_json(api_summarize(state(), body).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summarize_ok() {
        let body = Ok(Json(SummarizeRequest {
            text: "title: X\nY".into(),
        }));
        let (status, body) = body_json(api_summarize(state(), body).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Stub");
    }

    #[tokio::test]
    async fn test_digest_success() {
        let (status, body) = body_json(api_digest(state(), interests(&["coral"])).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["article"]["title"], "Stub");
        assert_eq!(body["article"]["link"], "https://example.org/paper");
        assert_eq!(body["article"]["originalTitle"], "coral review");
    }
}
