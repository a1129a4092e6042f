mod client;
mod error;
pub mod models;
mod parse;

pub use client::TorznabClient;
pub use error::TorznabError;
pub use models::ReleaseItem;
pub use parse::parse_torznab_feed;

pub type Result<T> = std::result::Result<T, TorznabError>;
