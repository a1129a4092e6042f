mod auth;
mod client;
mod error;
mod history;
pub mod models;
mod queue;

pub use client::SabnzbdClient;
pub use error::SabnzbdError;
pub use models::{AddUrlResult, AuthResult, HistorySlot, QueueSlot};

pub type Result<T> = std::result::Result<T, SabnzbdError>;
