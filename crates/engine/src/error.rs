use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SABnzbd error: {0}")]
    Sabnzbd(#[from] sabnzbd::SabnzbdError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Download engine not configured")]
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, EngineError>;
