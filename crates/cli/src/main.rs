use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use server::Config;

#[derive(Parser)]
#[command(name = "gazarr")]
#[command(about = "Magazine acquisition server", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8484", env = "GAZARR_PORT")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "GAZARR_HOST")]
    host: String,

    /// Database file path
    #[arg(short, long, default_value = "gazarr.db", env = "GAZARR_DATABASE")]
    database: String,

    /// SABnzbd base URL
    #[arg(long, default_value = "", env = "GAZARR_SABNZBD_URL")]
    sabnzbd_url: String,

    /// SABnzbd API key
    #[arg(long, default_value = "", env = "GAZARR_SABNZBD_API_KEY")]
    sabnzbd_api_key: String,

    /// SABnzbd category for submitted downloads
    #[arg(long, env = "GAZARR_SABNZBD_CATEGORY")]
    sabnzbd_category: Option<String>,

    /// Directory SABnzbd completes downloads into
    #[arg(long, default_value = "downloads/complete", env = "GAZARR_SOURCE_DIR")]
    source_dir: PathBuf,

    /// Library root imported issues are moved under
    #[arg(long, default_value = "library", env = "GAZARR_TARGET_DIR")]
    target_dir: PathBuf,

    /// Optional staging directory used while importing
    #[arg(long, env = "GAZARR_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Seconds between auto-download scans
    #[arg(long, default_value = "900", env = "GAZARR_SCAN_INTERVAL")]
    scan_interval: u64,

    /// Seconds between download status syncs
    #[arg(long, default_value = "30", env = "GAZARR_TRACKER_INTERVAL")]
    tracker_interval: u64,

    /// Seconds between completed-downloads scans
    #[arg(long, default_value = "60", env = "GAZARR_MONITOR_INTERVAL")]
    monitor_interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let database_url = format!("sqlite:{}?mode=rwc", cli.database);

    let mut config = Config::new(database_url);
    config.engine = engine::EngineConfig::sabnzbd(cli.sabnzbd_url, cli.sabnzbd_api_key);
    config.engine.category = cli.sabnzbd_category;
    config.auto_download.poll_interval_secs = cli.scan_interval;
    config.tracker.poll_interval_secs = cli.tracker_interval;
    config.monitor.poll_interval_secs = cli.monitor_interval;
    config.monitor.source_dir = cli.source_dir;
    config.monitor.target_dir = cli.target_dir;
    config.monitor.staging_dir = cli.staging_dir;

    server::run_server(addr, config).await
}
