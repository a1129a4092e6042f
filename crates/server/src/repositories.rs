pub mod download_job;
pub mod magazine;
pub mod provider;

pub use download_job::DownloadJobRepository;
pub use magazine::MagazineRepository;
pub use provider::ProviderRepository;
