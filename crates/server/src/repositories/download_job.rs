use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{DownloadJob, DownloadStatus, JobStatusUpdate, UpsertDownloadJob};

/// Common SELECT fields for download job queries
const SELECT_JOB: &str = r#"
    SELECT
        id, engine_id, title, magazine_title, link, content_name,
        status, engine_status, progress, time_remaining, message,
        clean_name, staging_path,
        issue_code, issue_label, issue_year, issue_month, issue_number,
        last_seen, created_at, updated_at, completed_at, moved_at
    FROM download_job
"#;

pub struct DownloadJobRepository;

impl DownloadJobRepository {
    /// Get a job by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<DownloadJob>, sqlx::Error> {
        let query = format!("{} WHERE id = $1", SELECT_JOB);
        let row = sqlx::query_as::<_, DownloadJobRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get the first job recorded under an engine identifier
    pub async fn get_by_engine_id(
        pool: &SqlitePool,
        engine_id: &str,
    ) -> Result<Option<DownloadJob>, sqlx::Error> {
        let query = format!("{} WHERE engine_id = $1 ORDER BY id ASC LIMIT 1", SELECT_JOB);
        let row = sqlx::query_as::<_, DownloadJobRow>(&query)
            .bind(engine_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Create or refresh a job keyed by its engine identifier.
    ///
    /// On update, `title`, `link` and `status` are applied only when
    /// non-empty and different; issue identity fields only when present
    /// and different. `updated_at` moves only if a field actually changed.
    pub async fn upsert_by_engine_id(
        pool: &SqlitePool,
        data: UpsertDownloadJob,
    ) -> Result<DownloadJob, sqlx::Error> {
        let existing = Self::get_by_engine_id(pool, &data.engine_id).await?;
        let Some(existing) = existing else {
            return Self::create(pool, data).await;
        };

        let mut title = existing.title.clone();
        let mut link = existing.link.clone();
        let mut status = existing.status.clone();
        let mut magazine_title = existing.magazine_title.clone();
        let mut issue_code = existing.issue_code.clone();
        let mut issue_label = existing.issue_label.clone();
        let mut issue_year = existing.issue_year;
        let mut issue_month = existing.issue_month;
        let mut issue_number = existing.issue_number;

        let mut changed = false;

        if !data.title.trim().is_empty() && data.title != title {
            title = data.title;
            changed = true;
        }
        if let Some(new_link) = data.link {
            if !new_link.trim().is_empty() && Some(new_link.as_str()) != link.as_deref() {
                link = Some(new_link);
                changed = true;
            }
        }
        if let Some(new_status) = data.status {
            if new_status != status {
                status = new_status;
                changed = true;
            }
        }
        if let Some(new_magazine) = data.magazine_title {
            if Some(new_magazine.as_str()) != magazine_title.as_deref() {
                magazine_title = Some(new_magazine);
                changed = true;
            }
        }
        if let Some(code) = data.issue_code {
            if Some(code.as_str()) != issue_code.as_deref() {
                issue_code = Some(code);
                changed = true;
            }
        }
        if let Some(label) = data.issue_label {
            if Some(label.as_str()) != issue_label.as_deref() {
                issue_label = Some(label);
                changed = true;
            }
        }
        if let Some(year) = data.issue_year {
            if Some(year) != issue_year {
                issue_year = Some(year);
                changed = true;
            }
        }
        if let Some(month) = data.issue_month {
            if Some(month) != issue_month {
                issue_month = Some(month);
                changed = true;
            }
        }
        if let Some(number) = data.issue_number {
            if Some(number) != issue_number {
                issue_number = Some(number);
                changed = true;
            }
        }

        let updated_at = if changed { Utc::now() } else { existing.updated_at };

        sqlx::query(
            r#"
            UPDATE download_job SET
                title = $1,
                link = $2,
                status = $3,
                magazine_title = $4,
                issue_code = $5,
                issue_label = $6,
                issue_year = $7,
                issue_month = $8,
                issue_number = $9,
                updated_at = $10
            WHERE id = $11
            "#,
        )
        .bind(&title)
        .bind(&link)
        .bind(status.as_str())
        .bind(&magazine_title)
        .bind(&issue_code)
        .bind(&issue_label)
        .bind(issue_year)
        .bind(issue_month)
        .bind(issue_number)
        .bind(updated_at)
        .bind(existing.id)
        .execute(pool)
        .await?;

        Self::get_by_id(pool, existing.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    async fn create(pool: &SqlitePool, data: UpsertDownloadJob) -> Result<DownloadJob, sqlx::Error> {
        let now = Utc::now();
        let status = data.status.unwrap_or(DownloadStatus::Pending);

        let result = sqlx::query(
            r#"
            INSERT INTO download_job (
                engine_id, title, magazine_title, link, status,
                issue_code, issue_label, issue_year, issue_month, issue_number,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&data.engine_id)
        .bind(&data.title)
        .bind(&data.magazine_title)
        .bind(&data.link)
        .bind(status.as_str())
        .bind(&data.issue_code)
        .bind(&data.issue_label)
        .bind(data.issue_year)
        .bind(data.issue_month)
        .bind(data.issue_number)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::get_by_id(pool, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Apply a tracker reconciliation delta.
    ///
    /// `last_seen` is always refreshed. Terminal jobs (`failed`, `moved`)
    /// get the `last_seen` refresh and nothing else; the UPDATE itself
    /// repeats that guard so a terminal transition landing between the
    /// read and the write cannot be overwritten. `updated_at` moves
    /// only when some field actually changed.
    pub async fn apply_status_update(
        pool: &SqlitePool,
        id: i64,
        update: JobStatusUpdate,
    ) -> Result<Option<DownloadJob>, sqlx::Error> {
        let Some(existing) = Self::get_by_id(pool, id).await? else {
            return Ok(None);
        };

        let now = Utc::now();

        if existing.status.is_terminal() {
            sqlx::query("UPDATE download_job SET last_seen = $1 WHERE id = $2")
                .bind(now)
                .bind(id)
                .execute(pool)
                .await?;
            return Self::get_by_id(pool, id).await;
        }

        let mut status = existing.status.clone();
        let mut engine_status = existing.engine_status.clone();
        let mut progress = existing.progress;
        let mut time_remaining = existing.time_remaining.clone();
        let mut message = existing.message.clone();
        let mut content_name = existing.content_name.clone();
        let mut clean_name = existing.clean_name.clone();
        let mut staging_path = existing.staging_path.clone();
        let mut completed_at = existing.completed_at;

        let mut changed = false;

        if let Some(new_status) = update.status {
            if new_status != status {
                status = new_status;
                changed = true;
            }
        }
        if let Some(raw) = update.engine_status {
            if Some(raw.as_str()) != engine_status.as_deref() {
                engine_status = Some(raw);
                changed = true;
            }
        }
        if let Some(new_progress) = update.progress {
            if (new_progress - progress).abs() > f64::EPSILON {
                progress = new_progress;
                changed = true;
            }
        }
        if let Some(new_remaining) = update.time_remaining {
            if new_remaining != time_remaining {
                time_remaining = new_remaining;
                changed = true;
            }
        }
        if let Some(new_message) = update.message {
            if new_message != message {
                message = new_message;
                changed = true;
            }
        }
        if let Some(name) = update.content_name {
            if !name.trim().is_empty() && Some(name.as_str()) != content_name.as_deref() {
                content_name = Some(name);
                changed = true;
            }
        }
        if let Some(name) = update.clean_name {
            if !name.trim().is_empty() && Some(name.as_str()) != clean_name.as_deref() {
                clean_name = Some(name);
                changed = true;
            }
        }
        if let Some(path) = update.staging_path {
            if path != staging_path {
                staging_path = path;
                changed = true;
            }
        }
        if let Some(at) = update.completed_at {
            if completed_at.is_none() {
                completed_at = Some(at);
                changed = true;
            }
        }

        let updated_at = if changed { now } else { existing.updated_at };

        sqlx::query(
            r#"
            UPDATE download_job SET
                status = $1,
                engine_status = $2,
                progress = $3,
                time_remaining = $4,
                message = $5,
                content_name = $6,
                clean_name = $7,
                staging_path = $8,
                completed_at = $9,
                last_seen = $10,
                updated_at = $11
            WHERE id = $12 AND status NOT IN ('failed', 'moved')
            "#,
        )
        .bind(status.as_str())
        .bind(&engine_status)
        .bind(progress)
        .bind(&time_remaining)
        .bind(&message)
        .bind(&content_name)
        .bind(&clean_name)
        .bind(&staging_path)
        .bind(completed_at)
        .bind(now)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;

        Self::get_by_id(pool, id).await
    }

    /// Mark a job failed with an explanatory message. No-op on jobs
    /// already in a terminal state.
    pub async fn mark_failed(
        pool: &SqlitePool,
        id: i64,
        message: &str,
    ) -> Result<Option<DownloadJob>, sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE download_job SET
                status = 'failed', message = $1, updated_at = $2
            WHERE id = $3 AND status NOT IN ('failed', 'moved')
            "#,
        )
        .bind(message)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

        Self::get_by_id(pool, id).await
    }

    /// Mark a job moved into the library. No-op on jobs already in a
    /// terminal state.
    pub async fn mark_moved(
        pool: &SqlitePool,
        id: i64,
        destination: &str,
        clean_name: &str,
    ) -> Result<Option<DownloadJob>, sqlx::Error> {
        let now = Utc::now();
        let message = format!("Moved to {}", destination);
        sqlx::query(
            r#"
            UPDATE download_job SET
                status = 'moved',
                engine_status = 'Processed',
                message = $1,
                clean_name = $2,
                staging_path = NULL,
                moved_at = $3,
                updated_at = $3
            WHERE id = $4 AND status NOT IN ('failed', 'moved')
            "#,
        )
        .bind(&message)
        .bind(clean_name)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

        Self::get_by_id(pool, id).await
    }

    /// All jobs not yet in a terminal state, oldest first
    pub async fn list_non_terminal(pool: &SqlitePool) -> Result<Vec<DownloadJob>, sqlx::Error> {
        let query = format!(
            "{} WHERE status NOT IN ('failed', 'moved') ORDER BY id ASC",
            SELECT_JOB
        );
        let rows = sqlx::query_as::<_, DownloadJobRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Jobs currently in any of the given statuses
    pub async fn list_by_statuses(
        pool: &SqlitePool,
        statuses: &[DownloadStatus],
    ) -> Result<Vec<DownloadJob>, sqlx::Error> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=statuses.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "{} WHERE status IN ({}) ORDER BY id ASC",
            SELECT_JOB, placeholders
        );

        let mut q = sqlx::query_as::<_, DownloadJobRow>(&query);
        for status in statuses {
            q = q.bind(status.as_str().to_string());
        }
        let rows = q.fetch_all(pool).await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Jobs attributed to a magazine, used to build the dedup index
    pub async fn list_with_magazine(pool: &SqlitePool) -> Result<Vec<DownloadJob>, sqlx::Error> {
        let query = format!(
            "{} WHERE magazine_title IS NOT NULL AND TRIM(magazine_title) != ''",
            SELECT_JOB
        );
        let rows = sqlx::query_as::<_, DownloadJobRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Most recently touched jobs first
    pub async fn list_recent(
        pool: &SqlitePool,
        limit: i64,
    ) -> Result<Vec<DownloadJob>, sqlx::Error> {
        let query = format!("{} ORDER BY updated_at DESC LIMIT $1", SELECT_JOB);
        let rows = sqlx::query_as::<_, DownloadJobRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Internal row type for mapping SQLite results
#[derive(Debug, sqlx::FromRow)]
struct DownloadJobRow {
    id: i64,
    engine_id: Option<String>,
    title: String,
    magazine_title: Option<String>,
    link: Option<String>,
    content_name: Option<String>,
    status: String,
    engine_status: Option<String>,
    progress: f64,
    time_remaining: Option<String>,
    message: Option<String>,
    clean_name: Option<String>,
    staging_path: Option<String>,
    issue_code: Option<String>,
    issue_label: Option<String>,
    issue_year: Option<i32>,
    issue_month: Option<i32>,
    issue_number: Option<i64>,
    last_seen: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    moved_at: Option<DateTime<Utc>>,
}

impl From<DownloadJobRow> for DownloadJob {
    fn from(row: DownloadJobRow) -> Self {
        Self {
            id: row.id,
            engine_id: row.engine_id,
            title: row.title,
            magazine_title: row.magazine_title,
            link: row.link,
            content_name: row.content_name,
            status: DownloadStatus::parse(&row.status),
            engine_status: row.engine_status,
            progress: row.progress,
            time_remaining: row.time_remaining,
            message: row.message,
            clean_name: row.clean_name,
            staging_path: row.staging_path,
            issue_code: row.issue_code,
            issue_label: row.issue_label,
            issue_year: row.issue_year,
            issue_month: row.issue_month,
            issue_number: row.issue_number,
            last_seen: row.last_seen,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
            moved_at: row.moved_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    fn upsert(engine_id: &str, title: &str) -> UpsertDownloadJob {
        UpsertDownloadJob {
            engine_id: engine_id.to_string(),
            title: title.to_string(),
            status: Some(DownloadStatus::Queued),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let job = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_1", "PC Gamer Issue 345"))
            .await
            .unwrap();
        assert_eq!(job.status, DownloadStatus::Queued);
        assert_eq!(job.engine_id.as_deref(), Some("nzo_1"));

        let mut data = upsert("nzo_1", "PC Gamer Issue 345");
        data.status = Some(DownloadStatus::Downloading);
        let updated = DownloadJobRepository::upsert_by_engine_id(&pool, data)
            .await
            .unwrap();
        assert_eq!(updated.id, job.id, "same engine id must map to same job");
        assert_eq!(updated.status, DownloadStatus::Downloading);
    }

    #[tokio::test]
    async fn test_upsert_without_changes_keeps_updated_at() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let job = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_2", "Vogue 08 2025"))
            .await
            .unwrap();
        let same = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_2", "Vogue 08 2025"))
            .await
            .unwrap();
        assert_eq!(same.updated_at, job.updated_at);
    }

    #[tokio::test]
    async fn test_status_update_refreshes_last_seen_only_when_unchanged() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let job = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_3", "Stereoplay"))
            .await
            .unwrap();

        let after = DownloadJobRepository::apply_status_update(&pool, job.id, JobStatusUpdate::default())
            .await
            .unwrap()
            .unwrap();
        assert!(after.last_seen.is_some());
        assert_eq!(after.updated_at, job.updated_at, "no delta, no updated_at bump");

        let delta = JobStatusUpdate {
            status: Some(DownloadStatus::Downloading),
            progress: Some(42.0),
            ..Default::default()
        };
        let after = DownloadJobRepository::apply_status_update(&pool, job.id, delta)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.status, DownloadStatus::Downloading);
        assert_eq!(after.progress, 42.0);
        assert!(after.updated_at > job.updated_at);
    }

    #[tokio::test]
    async fn test_terminal_jobs_only_get_last_seen() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let job = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_4", "Old Job"))
            .await
            .unwrap();
        DownloadJobRepository::mark_failed(&pool, job.id, "gone")
            .await
            .unwrap();

        let delta = JobStatusUpdate {
            status: Some(DownloadStatus::Downloading),
            progress: Some(10.0),
            ..Default::default()
        };
        let after = DownloadJobRepository::apply_status_update(&pool, job.id, delta)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.status, DownloadStatus::Failed, "terminal status must stick");
        assert_eq!(after.progress, 0.0);
        assert!(after.last_seen.is_some());
    }

    #[tokio::test]
    async fn test_mark_moved_sets_terminal_fields() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let job = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_5", "Fernsehwoche"))
            .await
            .unwrap();

        let moved = DownloadJobRepository::mark_moved(
            &pool,
            job.id,
            "/library/Fernsehwoche/Fernsehwoche 03 2024.pdf",
            "Fernsehwoche 03 2024",
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(moved.status, DownloadStatus::Moved);
        assert_eq!(moved.engine_status.as_deref(), Some("Processed"));
        assert_eq!(
            moved.message.as_deref(),
            Some("Moved to /library/Fernsehwoche/Fernsehwoche 03 2024.pdf")
        );
        assert_eq!(moved.clean_name.as_deref(), Some("Fernsehwoche 03 2024"));
        assert!(moved.staging_path.is_none());
        assert!(moved.moved_at.is_some());
    }

    #[tokio::test]
    async fn test_terminal_transitions_do_not_clobber_each_other() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let job = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_m", "Moved First"))
            .await
            .unwrap();
        DownloadJobRepository::mark_moved(&pool, job.id, "/library/M.pdf", "M")
            .await
            .unwrap();
        let after = DownloadJobRepository::mark_failed(&pool, job.id, "stalled")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.status, DownloadStatus::Moved, "moved row must survive a late failure");
        assert_eq!(after.message.as_deref(), Some("Moved to /library/M.pdf"));

        let job = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_f", "Failed First"))
            .await
            .unwrap();
        DownloadJobRepository::mark_failed(&pool, job.id, "boom").await.unwrap();
        let after = DownloadJobRepository::mark_moved(&pool, job.id, "/library/F.pdf", "F")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.status, DownloadStatus::Failed);
        assert!(after.moved_at.is_none());
    }

    #[tokio::test]
    async fn test_list_non_terminal_excludes_failed_and_moved() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let a = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_a", "A"))
            .await
            .unwrap();
        let b = DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_b", "B"))
            .await
            .unwrap();
        DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_c", "C"))
            .await
            .unwrap();

        DownloadJobRepository::mark_failed(&pool, a.id, "boom").await.unwrap();
        DownloadJobRepository::mark_moved(&pool, b.id, "/lib/B.pdf", "B").await.unwrap();

        let jobs = DownloadJobRepository::list_non_terminal(&pool).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "C");
    }

    #[tokio::test]
    async fn test_list_by_statuses() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let mut data = upsert("nzo_d", "D");
        data.status = Some(DownloadStatus::Completed);
        DownloadJobRepository::upsert_by_engine_id(&pool, data).await.unwrap();
        DownloadJobRepository::upsert_by_engine_id(&pool, upsert("nzo_e", "E"))
            .await
            .unwrap();

        let jobs = DownloadJobRepository::list_by_statuses(
            &pool,
            &[DownloadStatus::Completed, DownloadStatus::Processing],
        )
        .await
        .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "D");
    }
}
