use serde::{Serialize, Serializer};
use thiserror::Error;

/// Failure classes a pipeline stage can report. Stages never return these as
/// `Err`; they ride along in the stage's response so callers always get a
/// complete shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No usable data from upstream: {0}")]
    UpstreamEmpty(String),

    #[error("Malformed upstream response: {0}")]
    UpstreamMalformed(String),

    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl DigestError {
    pub fn missing_setting(name: &str) -> Self {
        DigestError::Configuration(format!("{name} is not set"))
    }
}

impl Serialize for DigestError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<scholar_client::ScholarError> for DigestError {
    fn from(err: scholar_client::ScholarError) -> Self {
        match err {
            scholar_client::ScholarError::Parse(msg) => DigestError::UpstreamMalformed(msg),
            other => DigestError::Transport(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for DigestError {
    fn from(err: anyhow::Error) -> Self {
        DigestError::Transport(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_display_string() {
        let err = DigestError::missing_setting("SERPAPI_API_KEY");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!("Configuration error: SERPAPI_API_KEY is not set")
        );
    }

    #[test]
    fn test_scholar_parse_error_is_malformed() {
        let err: DigestError = scholar_client::ScholarError::Parse("bad json".into()).into();
        assert!(matches!(err, DigestError::UpstreamMalformed(_)));
    }

    #[test]
    fn test_scholar_api_error_is_transport() {
        let err: DigestError = scholar_client::ScholarError::Api {
            status: 503,
            message: "down".into(),
        }
        .into();
        assert!(matches!(err, DigestError::Transport(msg) if msg.contains("503")));
    }
}
