mod client;
mod config;
mod error;
mod models;
mod sabnzbd_impl;
mod traits;

pub use client::EngineClient;
pub use config::{EngineConfig, EngineType};
pub use error::EngineError;
pub use models::{HistoryItem, QueueItem};
pub use sabnzbd_impl::SabnzbdEngine;
pub use traits::DownloadEngine;

/// Result type alias for download-engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
