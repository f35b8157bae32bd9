use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScholarError>;

#[derive(Debug, Error)]
pub enum ScholarError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ScholarError {
    fn from(err: reqwest::Error) -> Self {
        ScholarError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ScholarError {
    fn from(err: serde_json::Error) -> Self {
        ScholarError::Parse(err.to_string())
    }
}
