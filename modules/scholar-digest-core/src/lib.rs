pub mod chooser;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod query_generator;
pub mod search_provider;
pub mod summarizer;
pub mod types;

pub use chooser::{Chooser, FixedChooser, RandomChooser, SeededChooser};
pub use config::AppConfig;
pub use error::DigestError;
pub use pipeline::{Pipeline, PipelineOutcome};
pub use query_generator::{OpenAiQueryGenerator, QueryGenerator};
pub use search_provider::{ScholarSearchProvider, SearchProvider};
pub use summarizer::{ClaudeSummarizer, Summarizer};
pub use types::{
    ArticleView, GeneratedQueries, Interests, SearchDetails, SearchResponse, SearchResult,
    SummaryResult,
};
