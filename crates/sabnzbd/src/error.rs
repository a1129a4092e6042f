use thiserror::Error;

#[derive(Debug, Error)]
pub enum SabnzbdError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SABnzbd API error: {0}")]
    Api(String),
}
