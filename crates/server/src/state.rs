use std::sync::Arc;
use std::time::Duration;

use engine::{DownloadEngine, EngineClient, EngineError};
use sqlx::SqlitePool;
use torznab::TorznabClient;

use crate::config::Config;
use crate::services::{
    AutoDownloadService, LibraryImporter, MonitorService, SchedulerService, SearchService,
    ServiceError, TrackerService,
};
use crate::services::scheduler::{AutoDownloadJob, MonitorJob, TrackerJob};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub engine: Option<Arc<dyn DownloadEngine>>,
    pub auto_download: Arc<AutoDownloadService>,
    pub tracker: Arc<TrackerService>,
    pub monitor: Arc<MonitorService>,
    pub scheduler: Arc<SchedulerService>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Result<Self, ServiceError> {
        let engine: Option<Arc<dyn DownloadEngine>> =
            match EngineClient::from_config(&config.engine) {
                Ok(client) => Some(Arc::new(client)),
                Err(EngineError::NotConfigured) => {
                    tracing::info!("download engine not configured, pipeline jobs will idle");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to initialise download engine");
                    None
                }
            };

        let torznab = TorznabClient::new(Duration::from_secs(config.search.timeout_secs))?;
        let search = Arc::new(SearchService::new(
            db.clone(),
            torznab,
            config.search.max_age_days,
        ));

        let auto_download = Arc::new(AutoDownloadService::new(
            db.clone(),
            search,
            engine.clone(),
            config.auto_download.clone(),
        ));
        let tracker = Arc::new(TrackerService::new(
            db.clone(),
            engine.clone(),
            config.tracker.clone(),
        ));
        let monitor = Arc::new(MonitorService::new(
            db.clone(),
            config.monitor.clone(),
            Arc::new(LibraryImporter),
        ));

        if let Err(e) = monitor.ensure_dirs() {
            tracing::warn!(error = %e, "could not create download directories");
        }

        let scheduler = SchedulerService::new()
            .with_job(AutoDownloadJob::new(
                Arc::clone(&auto_download),
                Duration::from_secs(config.auto_download.poll_interval_secs),
            ))
            .with_job(TrackerJob::new(
                Arc::clone(&tracker),
                Duration::from_secs(config.tracker.poll_interval_secs),
            ))
            .with_job(MonitorJob::new(
                Arc::clone(&monitor),
                Duration::from_secs(config.monitor.poll_interval_secs),
            ));
        scheduler.start();

        Ok(Self {
            db,
            config: Arc::new(config),
            engine,
            auto_download,
            tracker,
            monitor,
            scheduler: Arc::new(scheduler),
        })
    }
}
