use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use scholar_digest_core::{
    AppConfig, ClaudeSummarizer, OpenAiQueryGenerator, Pipeline, QueryGenerator,
    ScholarSearchProvider, SearchProvider, Summarizer,
};

pub mod rest;

pub struct AppState {
    pub queries: Arc<dyn QueryGenerator>,
    pub search: Arc<dyn SearchProvider>,
    pub summarizer: Arc<dyn Summarizer>,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(
        queries: Arc<dyn QueryGenerator>,
        search: Arc<dyn SearchProvider>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let pipeline = Pipeline::new(queries.clone(), search.clone(), summarizer.clone());
        Self {
            queries,
            search,
            summarizer,
            pipeline,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(OpenAiQueryGenerator::from_config(config)),
            Arc::new(ScholarSearchProvider::from_config(config)),
            Arc::new(ClaudeSummarizer::from_config(config)),
        )
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(|| async { "ok" }))
        // Pipeline stages
        .route("/queries", post(rest::api_queries))
        .route("/search", get(rest::api_search).post(rest::api_search_interests))
        .route("/summarize", post(rest::api_summarize))
        // Whole pipeline
        .route("/digest", post(rest::api_digest))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Every answer is a fresh pick; never cache
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        // Logging layer: method + path only (no query params, no bodies)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
