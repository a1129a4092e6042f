pub mod downloads;
pub mod jobs;
pub mod library;
pub mod scan;
pub mod system;
