use thiserror::Error;

#[derive(Debug, Error)]
pub enum TorznabError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),
}
