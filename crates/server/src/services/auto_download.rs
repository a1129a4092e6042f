use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use engine::{DownloadEngine, EngineError};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::config::AutoDownloadConfig;
use crate::models::{DownloadJob, DownloadStatus, Magazine, SearchResult, UpsertDownloadJob};
use crate::repositories::{DownloadJobRepository, MagazineRepository};
use crate::services::search::ReleaseSearch;
use crate::services::ServiceError;

/// Words too generic to identify a magazine in a release title.
const STOP_WORDS: [&str; 6] = ["mag", "magazine", "ebook", "digital", "issue", "revista"];

/// Selects fresh issues from provider search results and hands them to
/// the download engine.
///
/// Scans are single-flight: the periodic job and manual triggers share
/// one lock, and a manual trigger reports "busy" instead of queueing up
/// behind a running scan.
pub struct AutoDownloadService {
    pool: SqlitePool,
    search: Arc<dyn ReleaseSearch>,
    engine: Option<Arc<dyn DownloadEngine>>,
    config: std::sync::RwLock<AutoDownloadConfig>,
    scan_lock: Mutex<()>,
}

/// Per-magazine dedup state, seeded from stored jobs and extended as
/// candidates are selected within a cycle.
#[derive(Default)]
struct MagazineBucket {
    /// Issue identities with a live or finished job
    active: HashSet<String>,
    /// Links already recorded per issue identity
    links: HashMap<String, HashSet<String>>,
}

impl AutoDownloadService {
    pub fn new(
        pool: SqlitePool,
        search: Arc<dyn ReleaseSearch>,
        engine: Option<Arc<dyn DownloadEngine>>,
        config: AutoDownloadConfig,
    ) -> Self {
        Self {
            pool,
            search,
            engine,
            config: std::sync::RwLock::new(config),
            scan_lock: Mutex::new(()),
        }
    }

    /// Swap settings; takes effect from the next cycle.
    pub fn update_config(&self, config: AutoDownloadConfig) {
        let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
        *guard = config;
    }

    fn max_results_per_scan(&self) -> usize {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .max_results_per_scan
            .max(1)
    }

    /// Run one scan cycle, waiting if another scan holds the lock.
    pub async fn scan(&self) -> Result<usize, ServiceError> {
        let _guard = self.scan_lock.lock().await;
        self.scan_inner().await
    }

    /// Trigger a scan unless one is already running.
    ///
    /// Returns `(started, enqueued)`.
    pub async fn scan_now(&self) -> Result<(bool, usize), ServiceError> {
        match self.scan_lock.try_lock() {
            Ok(_guard) => {
                let enqueued = self.scan_inner().await?;
                Ok((true, enqueued))
            }
            Err(_) => Ok((false, 0)),
        }
    }

    async fn scan_inner(&self) -> Result<usize, ServiceError> {
        let Some(engine) = &self.engine else {
            tracing::debug!("download engine not configured, skipping auto-download scan");
            return Ok(0);
        };

        let results = self.search.search_magazines().await?;
        if results.is_empty() {
            tracing::debug!("no provider results this cycle");
            return Ok(0);
        }

        let magazines: HashMap<String, Magazine> = MagazineRepository::list_active(&self.pool)
            .await?
            .into_iter()
            .map(|m| (m.title.trim().to_lowercase(), m))
            .collect();
        let jobs = DownloadJobRepository::list_with_magazine(&self.pool).await?;
        let mut index = build_job_index(&jobs);

        let candidates = self.select_candidates(&results, &magazines, &mut index);

        let mut enqueued = 0;
        for candidate in candidates {
            match engine.enqueue(&candidate.link, Some(&candidate.title)).await {
                Ok(ids) if !ids.is_empty() => {
                    for engine_id in &ids {
                        self.record_enqueued(engine_id, &candidate).await?;
                    }
                    tracing::info!(
                        title = %candidate.title,
                        magazine = %candidate.magazine_title,
                        "enqueued new issue"
                    );
                    enqueued += 1;
                }
                Ok(_) => {
                    tracing::warn!(title = %candidate.title, "engine accepted but returned no ids");
                }
                Err(EngineError::NotConfigured) => {
                    tracing::debug!(title = %candidate.title, "download engine not configured, skipping candidate");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(title = %candidate.title, error = %e, "failed to enqueue candidate");
                }
            }
        }

        tracing::info!(enqueued, "auto-download scan finished");
        Ok(enqueued)
    }

    async fn record_enqueued(
        &self,
        engine_id: &str,
        candidate: &SearchResult,
    ) -> Result<DownloadJob, ServiceError> {
        let job = DownloadJobRepository::upsert_by_engine_id(
            &self.pool,
            UpsertDownloadJob {
                engine_id: engine_id.to_string(),
                title: candidate.title.clone(),
                magazine_title: Some(candidate.magazine_title.clone()),
                link: Some(candidate.link.clone()),
                status: Some(DownloadStatus::Queued),
                issue_code: candidate.issue_code.clone(),
                issue_label: candidate.issue_label.clone(),
                issue_year: candidate.issue_year,
                issue_month: candidate.issue_month,
                issue_number: candidate.issue_number,
            },
        )
        .await?;
        Ok(job)
    }

    /// Pick at most `max_results_per_scan` results, one per unseen issue.
    ///
    /// Selected identities and links are marked in the bucket immediately
    /// so later results for the same issue lose within this cycle too.
    fn select_candidates<'a>(
        &self,
        results: &'a [SearchResult],
        magazines: &HashMap<String, Magazine>,
        index: &mut HashMap<String, MagazineBucket>,
    ) -> Vec<&'a SearchResult> {
        let cap = self.max_results_per_scan();
        let mut selected = Vec::new();

        for result in results {
            if selected.len() >= cap {
                break;
            }

            let key = result.magazine_title.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            let Some(magazine) = magazines.get(&key) else {
                continue;
            };
            if !passes_guard(magazine, result) {
                continue;
            }
            let Some(identity) = issue_identifier(
                &result.magazine_title,
                result.issue_code.as_deref(),
                result.issue_year,
                result.issue_month,
                result.issue_number,
                &result.title,
            ) else {
                continue;
            };

            let bucket = index.entry(key).or_default();
            if bucket.active.contains(&identity) {
                continue;
            }
            if bucket
                .links
                .get(&identity)
                .is_some_and(|links| links.contains(&result.link))
            {
                continue;
            }

            bucket.active.insert(identity.clone());
            bucket
                .links
                .entry(identity)
                .or_default()
                .insert(result.link.clone());
            selected.push(result);
        }

        selected
    }
}

/// Statuses that count as "this issue is already handled".
fn counts_for_dedup(status: &DownloadStatus) -> bool {
    matches!(
        status,
        DownloadStatus::Pending
            | DownloadStatus::Queued
            | DownloadStatus::Downloading
            | DownloadStatus::Processing
            | DownloadStatus::Completed
            | DownloadStatus::Moved
    )
}

fn build_job_index(jobs: &[DownloadJob]) -> HashMap<String, MagazineBucket> {
    let mut index: HashMap<String, MagazineBucket> = HashMap::new();

    for job in jobs {
        let Some(magazine) = job.magazine_title.as_deref() else {
            continue;
        };
        let key = magazine.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let bucket = index.entry(key).or_default();

        let Some(identity) = issue_identifier(
            magazine,
            job.issue_code.as_deref(),
            job.issue_year,
            job.issue_month,
            job.issue_number,
            &job.title,
        ) else {
            continue;
        };

        if counts_for_dedup(&job.status) {
            bucket.active.insert(identity.clone());
        }
        if let Some(link) = job.link.as_deref() {
            bucket.links.entry(identity).or_default().insert(link.to_string());
        }
    }

    index
}

/// Stable identity of one issue of one magazine.
///
/// Prefers the parsed issue code, then the year/month/number triple,
/// then the normalised release title.
fn issue_identifier(
    magazine_title: &str,
    issue_code: Option<&str>,
    issue_year: Option<i32>,
    issue_month: Option<i32>,
    issue_number: Option<i64>,
    title: &str,
) -> Option<String> {
    let magazine = magazine_title.trim().to_lowercase();
    if magazine.is_empty() {
        return None;
    }

    if let Some(code) = issue_code {
        if !code.trim().is_empty() {
            return Some(format!("{}::code::{}", magazine, code.trim()));
        }
    }

    let mut parts = Vec::new();
    if let Some(year) = issue_year {
        parts.push(format!("Y{:04}", year));
    }
    if let Some(month) = issue_month {
        parts.push(format!("M{:02}", month));
    }
    if let Some(number) = issue_number {
        parts.push(format!("N{:04}", number));
    }
    if !parts.is_empty() {
        return Some(format!("{}::{}", magazine, parts.join("-")));
    }

    let title = title.trim().to_lowercase();
    if !title.is_empty() {
        return Some(format!("{}::title::{}", magazine, title));
    }

    None
}

/// Apply the magazine's auto-download guard to one result.
///
/// The guard year boundary is inclusive: within the guard year, issues
/// at or above the guard number pass; later years always pass.
fn passes_guard(magazine: &Magazine, result: &SearchResult) -> bool {
    if let Some(min_year) = magazine.auto_since_year {
        match result.issue_year {
            None => return false,
            Some(year) if year < min_year => return false,
            Some(year) if year == min_year => {
                if let Some(min_issue) = magazine.auto_since_issue {
                    match result.issue_number {
                        None => return false,
                        Some(number) if number < min_issue => return false,
                        Some(_) => {}
                    }
                }
            }
            Some(_) => {}
        }
    } else if let Some(min_issue) = magazine.auto_since_issue {
        match result.issue_number {
            None => return false,
            Some(number) if number < min_issue => return false,
            Some(_) => {}
        }
    }

    let guard = guard_tokens(&magazine.title);
    if guard.is_empty() {
        return true;
    }
    let title_tokens: HashSet<String> = normalize_text(&result.title)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    guard.iter().all(|token| title_tokens.contains(token))
}

/// Significant tokens of a magazine title, used to reject search hits
/// that only match incidentally.
fn guard_tokens(title: &str) -> Vec<String> {
    normalize_text(title)
        .split_whitespace()
        .filter(|t| t.len() >= 3 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Lowercase, keep alphanumerics, collapse everything else to spaces.
fn normalize_text(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use engine::{HistoryItem, QueueItem};
    use std::sync::Mutex as StdMutex;

    use crate::db::create_pool;
    use crate::models::CreateMagazine;

    struct StaticSearch {
        results: Vec<SearchResult>,
    }

    #[async_trait]
    impl ReleaseSearch for StaticSearch {
        async fn search_magazines(&self) -> Result<Vec<SearchResult>, ServiceError> {
            Ok(self.results.clone())
        }
    }

    struct RecordingEngine {
        enqueued: StdMutex<Vec<String>>,
    }

    impl RecordingEngine {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                enqueued: StdMutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.enqueued.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DownloadEngine for RecordingEngine {
        async fn enqueue(&self, url: &str, _title: Option<&str>) -> engine::Result<Vec<String>> {
            let mut enqueued = self.enqueued.lock().unwrap();
            enqueued.push(url.to_string());
            Ok(vec![format!("nzo_{}", enqueued.len())])
        }

        async fn fetch_queue(&self) -> engine::Result<Vec<QueueItem>> {
            Ok(Vec::new())
        }

        async fn fetch_history(&self, _limit: u32) -> engine::Result<Vec<HistoryItem>> {
            Ok(Vec::new())
        }

        async fn test(&self) -> engine::Result<String> {
            Ok("ok".to_string())
        }

        fn engine_type(&self) -> &'static str {
            "mock"
        }
    }

    fn mk_result(magazine: &str, title: &str, link: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            link: link.to_string(),
            provider: "p".to_string(),
            magazine_title: magazine.to_string(),
            published: Some(Utc::now()),
            size: None,
            issue_code: None,
            issue_label: None,
            issue_year: None,
            issue_month: None,
            issue_day: None,
            issue_number: None,
        }
    }

    async fn mk_magazine(pool: &SqlitePool, title: &str, year: Option<i32>, issue: Option<i64>) {
        MagazineRepository::create(
            pool,
            CreateMagazine {
                title: title.to_string(),
                search_term: None,
                language: None,
                auto_since_year: year,
                auto_since_issue: issue,
            },
        )
        .await
        .unwrap();
    }

    fn service(
        pool: SqlitePool,
        results: Vec<SearchResult>,
        engine: Arc<RecordingEngine>,
        cap: usize,
    ) -> AutoDownloadService {
        AutoDownloadService::new(
            pool,
            Arc::new(StaticSearch { results }),
            Some(engine),
            AutoDownloadConfig {
                poll_interval_secs: 900,
                max_results_per_scan: cap,
            },
        )
    }

    #[tokio::test]
    async fn test_same_issue_enqueued_once_per_cycle() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        mk_magazine(&pool, "PC Gamer", None, None).await;

        let mut a = mk_result("PC Gamer", "PC Gamer Issue 345", "https://x/a");
        a.issue_number = Some(345);
        a.issue_code = Some("0345".to_string());
        let mut b = mk_result("PC Gamer", "PC Gamer No 345 repack", "https://x/b");
        b.issue_number = Some(345);
        b.issue_code = Some("0345".to_string());

        let engine = RecordingEngine::new();
        let svc = service(pool, vec![a, b], Arc::clone(&engine), 10);

        let enqueued = svc.scan().await.unwrap();
        assert_eq!(enqueued, 1, "second hit for the same issue must lose");
        assert_eq!(engine.urls(), vec!["https://x/a"]);
    }

    #[tokio::test]
    async fn test_guard_year_boundary_is_inclusive() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        mk_magazine(&pool, "Retro Gamer", Some(2024), Some(5)).await;

        let mut before = mk_result("Retro Gamer", "Retro Gamer 2024 Issue 4", "https://x/4");
        before.issue_year = Some(2024);
        before.issue_number = Some(4);
        let mut at = mk_result("Retro Gamer", "Retro Gamer 2024 Issue 6", "https://x/6");
        at.issue_year = Some(2024);
        at.issue_number = Some(6);
        let mut later = mk_result("Retro Gamer", "Retro Gamer 2025 Issue 1", "https://x/1");
        later.issue_year = Some(2025);
        later.issue_number = Some(1);

        let engine = RecordingEngine::new();
        let svc = service(pool, vec![before, at, later], Arc::clone(&engine), 10);

        let enqueued = svc.scan().await.unwrap();
        assert_eq!(enqueued, 2);
        assert_eq!(engine.urls(), vec!["https://x/6", "https://x/1"]);
    }

    #[tokio::test]
    async fn test_existing_job_suppresses_reenqueue() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        mk_magazine(&pool, "Vogue", None, None).await;

        let mut first = mk_result("Vogue", "Vogue 08 2025", "https://x/v1");
        first.issue_year = Some(2025);
        first.issue_number = Some(8);
        first.issue_code = Some("20250008".to_string());

        let engine = RecordingEngine::new();
        let svc = service(pool.clone(), vec![first.clone()], Arc::clone(&engine), 10);
        assert_eq!(svc.scan().await.unwrap(), 1);

        // Second cycle sees the same issue under a different link.
        let mut again = first.clone();
        again.link = "https://x/v2".to_string();
        let svc = service(pool, vec![again], Arc::clone(&engine), 10);
        assert_eq!(svc.scan().await.unwrap(), 0, "stored job must block the re-enqueue");
        assert_eq!(engine.urls(), vec!["https://x/v1"]);
    }

    #[tokio::test]
    async fn test_failed_job_allows_retry() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        mk_magazine(&pool, "Stereoplay", None, None).await;

        let mut result = mk_result("Stereoplay", "Stereoplay 03 2025", "https://x/s1");
        result.issue_year = Some(2025);
        result.issue_month = Some(3);
        result.issue_code = Some("2025-03-01".to_string());

        let engine = RecordingEngine::new();
        let svc = service(pool.clone(), vec![result.clone()], Arc::clone(&engine), 10);
        assert_eq!(svc.scan().await.unwrap(), 1);

        let job = DownloadJobRepository::get_by_engine_id(&pool, "nzo_1")
            .await
            .unwrap()
            .unwrap();
        DownloadJobRepository::mark_failed(&pool, job.id, "disk full")
            .await
            .unwrap();

        let mut retry = result.clone();
        retry.link = "https://x/s2".to_string();
        let svc = service(pool, vec![retry], Arc::clone(&engine), 10);
        assert_eq!(svc.scan().await.unwrap(), 1, "failed jobs do not hold the issue");
    }

    #[tokio::test]
    async fn test_cap_limits_selection() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        mk_magazine(&pool, "PC Gamer", None, None).await;

        let mut results = Vec::new();
        for n in 1..=5 {
            let mut r = mk_result(
                "PC Gamer",
                &format!("PC Gamer Issue {}", 340 + n),
                &format!("https://x/{}", n),
            );
            r.issue_number = Some(340 + n);
            results.push(r);
        }

        let engine = RecordingEngine::new();
        let svc = service(pool, results, Arc::clone(&engine), 2);
        assert_eq!(svc.scan().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_shared_link_does_not_suppress_other_issue() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        mk_magazine(&pool, "PC Gamer", None, None).await;

        // Provider serves two issues behind one bundle URL.
        let mut a = mk_result("PC Gamer", "PC Gamer Issue 345", "https://x/bundle");
        a.issue_number = Some(345);
        let mut b = mk_result("PC Gamer", "PC Gamer Issue 346", "https://x/bundle");
        b.issue_number = Some(346);

        let engine = RecordingEngine::new();
        let svc = service(pool, vec![a, b], Arc::clone(&engine), 10);
        assert_eq!(svc.scan().await.unwrap(), 2, "links dedup per issue, not per magazine");
    }

    #[tokio::test]
    async fn test_enqueue_failure_skips_candidate_only() {
        struct FlakyEngine {
            enqueued: StdMutex<Vec<String>>,
        }

        #[async_trait]
        impl DownloadEngine for FlakyEngine {
            async fn enqueue(&self, url: &str, _title: Option<&str>) -> engine::Result<Vec<String>> {
                if url.ends_with("/bad") {
                    return Err(EngineError::NotConfigured);
                }
                let mut enqueued = self.enqueued.lock().unwrap();
                enqueued.push(url.to_string());
                Ok(vec![format!("nzo_{}", enqueued.len())])
            }

            async fn fetch_queue(&self) -> engine::Result<Vec<QueueItem>> {
                Ok(Vec::new())
            }

            async fn fetch_history(&self, _limit: u32) -> engine::Result<Vec<HistoryItem>> {
                Ok(Vec::new())
            }

            async fn test(&self) -> engine::Result<String> {
                Ok("ok".to_string())
            }

            fn engine_type(&self) -> &'static str {
                "mock"
            }
        }

        let pool = create_pool("sqlite::memory:").await.unwrap();
        mk_magazine(&pool, "PC Gamer", None, None).await;

        let mut bad = mk_result("PC Gamer", "PC Gamer Issue 345", "https://x/bad");
        bad.issue_number = Some(345);
        let mut good = mk_result("PC Gamer", "PC Gamer Issue 346", "https://x/good");
        good.issue_number = Some(346);

        let engine = Arc::new(FlakyEngine {
            enqueued: StdMutex::new(Vec::new()),
        });
        let svc = AutoDownloadService::new(
            pool,
            Arc::new(StaticSearch {
                results: vec![bad, good],
            }),
            Some(Arc::clone(&engine) as Arc<dyn DownloadEngine>),
            AutoDownloadConfig::default(),
        );

        assert_eq!(svc.scan().await.unwrap(), 1, "later candidates still run");
        assert_eq!(*engine.enqueued.lock().unwrap(), vec!["https://x/good"]);
    }

    #[tokio::test]
    async fn test_scan_now_reports_busy() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let engine = RecordingEngine::new();
        let svc = service(pool, Vec::new(), engine, 10);

        let _held = svc.scan_lock.lock().await;
        let (started, enqueued) = svc.scan_now().await.unwrap();
        assert!(!started);
        assert_eq!(enqueued, 0);
    }

    #[test]
    fn test_issue_identifier_precedence() {
        assert_eq!(
            issue_identifier("PC Gamer", Some("20250345"), Some(2025), None, Some(345), "t"),
            Some("pc gamer::code::20250345".to_string())
        );
        assert_eq!(
            issue_identifier("PC Gamer", None, Some(2025), Some(3), None, "t"),
            Some("pc gamer::Y2025-M03".to_string())
        );
        assert_eq!(
            issue_identifier("PC Gamer", None, None, None, None, "Some Release"),
            Some("pc gamer::title::some release".to_string())
        );
        assert_eq!(issue_identifier("PC Gamer", None, None, None, None, "  "), None);
        assert_eq!(issue_identifier("  ", None, None, None, None, "t"), None);
    }

    #[test]
    fn test_guard_tokens_drop_stop_words() {
        assert_eq!(guard_tokens("PC Gamer Magazine"), vec!["gamer"]);
        assert!(guard_tokens("PC Mag").is_empty());
    }

    #[test]
    fn test_title_tokens_must_cover_magazine() {
        let mag = Magazine {
            id: 1,
            title: "Linux Format".to_string(),
            search_term: None,
            language: None,
            status: "Active".to_string(),
            auto_since_year: None,
            auto_since_issue: None,
            created_at: Utc::now(),
        };
        let mut hit = mk_result("Linux Format", "Linux Format Issue 300", "https://x/1");
        hit.issue_number = Some(300);
        assert!(passes_guard(&mag, &hit));

        let mut miss = mk_result("Linux Format", "Linux Voice Issue 300", "https://x/2");
        miss.issue_number = Some(300);
        assert!(!passes_guard(&mag, &miss));
    }
}
