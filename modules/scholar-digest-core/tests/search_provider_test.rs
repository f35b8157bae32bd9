//! Search provider behaviour against a mock SerpAPI server.

use scholar_client::ScholarClient;
use scholar_digest_core::{DigestError, Interests, ScholarSearchProvider, SearchProvider};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> ScholarSearchProvider {
    let client = ScholarClient::new("serp-key".into()).with_base_url(server.uri());
    ScholarSearchProvider::new(client, 20, "en")
}

fn hits(titles: &[&str]) -> serde_json::Value {
    let results: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| {
            json!({
                "position": i,
                "title": t,
                "result_id": format!("id-{i}"),
                "link": format!("https://example.org/{i}"),
                "snippet": format!("snippet {i}")
            })
        })
        .collect();
    json!({ "organic_results": results })
}

fn empty() -> serde_json::Value {
    json!({
        "search_information": { "organic_results_state": "Fully empty" },
        "error": "Google hasn't returned any results for this query."
    })
}

// ---------------------------------------------------------------------------
// Single attempt
// ---------------------------------------------------------------------------

#[tokio::test]
async fn results_are_returned_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "ocean heat uptake"))
        .and(query_param("start", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["a", "b", "c"])))
        .expect(1)
        .mount(&server)
        .await;

    let resp = provider(&server).search("ocean heat uptake", 1).await;

    assert!(resp.error.is_none());
    assert_eq!(resp.results.len(), 3);
    assert_eq!(resp.search_details.query, "ocean heat uptake");
    assert_eq!(resp.search_details.results_count, "3 results");
}

#[tokio::test]
async fn http_failure_becomes_synthetic_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key."})))
        .expect(1)
        .mount(&server)
        .await;

    let resp = provider(&server).search("ocean heat", 0).await;

    assert!(resp.results.is_empty());
    assert_eq!(resp.search_details.results_count, "0 results");
    assert!(matches!(resp.error, Some(DigestError::Transport(_))));
}

#[tokio::test]
async fn non_list_results_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic_results": "nope"})))
        .expect(1)
        .mount(&server)
        .await;

    let resp = provider(&server).search("ocean heat uptake", 0).await;
    assert!(matches!(resp.error, Some(DigestError::UpstreamMalformed(_))));
}

// ---------------------------------------------------------------------------
// Broadening
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_first_attempt_retries_once_with_broadened_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "\"coral bleaching\" in the red sea"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "coral bleaching"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["Reefs under stress"])))
        .expect(1)
        .mount(&server)
        .await;

    let resp = provider(&server)
        .search("\"coral bleaching\" in the red sea", 0)
        .await;

    assert_eq!(resp.results.len(), 1);
    assert_eq!(resp.search_details.query, "coral bleaching");
}

#[tokio::test]
async fn broadened_attempt_that_is_also_empty_is_final() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic_results": []})))
        .mount(&server)
        .await;

    let resp = provider(&server)
        .search("the effects of \"ocean acidification\" on reef fish", 0)
        .await;

    assert!(resp.results.is_empty());
    assert!(resp.error.is_none());
    assert_eq!(resp.search_details.query, "effects ocean acidification");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn no_retry_when_broadening_changes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic_results": []})))
        .mount(&server)
        .await;

    provider(&server).search("ocean warming", 0).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn no_retry_when_no_keyword_qualifies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic_results": []})))
        .mount(&server)
        .await;

    provider(&server).search("AI in ML", 0).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn no_retry_after_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    provider(&server).search("ocean heat uptake trends", 0).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Interest helpers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn advanced_query_is_sent_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "(AI AND climate) AND (oceans OR policy)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["x"])))
        .expect(1)
        .mount(&server)
        .await;

    let interests = Interests::new(["AI", "climate", "oceans", "policy"]).unwrap();
    let resp = provider(&server).search_with_advanced_query(&interests, 0).await;
    assert_eq!(resp.results.len(), 1);
}

#[tokio::test]
async fn interests_are_joined_with_spaces() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "AI climate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits(&["x"])))
        .expect(1)
        .mount(&server)
        .await;

    let interests = Interests::new(["AI", "climate"]).unwrap();
    let resp = provider(&server).search_by_interests(&interests, 0).await;
    assert_eq!(resp.results.len(), 1);
}
