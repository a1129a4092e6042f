use async_trait::async_trait;
use chrono::{Datelike, Duration, Utc};
use futures::future::join_all;
use sqlx::SqlitePool;
use torznab::TorznabClient;

use crate::models::{Magazine, Provider, SearchResult};
use crate::repositories::{MagazineRepository, ProviderRepository};
use crate::services::ServiceError;

/// Source of release candidates for the auto-download scheduler.
#[async_trait]
pub trait ReleaseSearch: Send + Sync {
    /// Search every enabled provider for every active magazine.
    async fn search_magazines(&self) -> Result<Vec<SearchResult>, ServiceError>;
}

/// Fans a search term out to all magazine-capable providers and merges
/// the results into one newest-first list.
pub struct SearchService {
    pool: SqlitePool,
    client: TorznabClient,
    max_age_days: i64,
}

impl SearchService {
    pub fn new(pool: SqlitePool, client: TorznabClient, max_age_days: i64) -> Self {
        Self {
            pool,
            client,
            max_age_days,
        }
    }

    async fn query_one(
        &self,
        provider: &Provider,
        magazine: &Magazine,
    ) -> Option<Vec<SearchResult>> {
        let term = magazine.query_term();
        match self
            .client
            .search(&provider.base_url, &provider.api_key, term)
            .await
        {
            Ok(items) => {
                let results = items
                    .into_iter()
                    .map(|item| {
                        let mut result = SearchResult {
                            title: item.title,
                            link: item.link,
                            provider: provider.name.clone(),
                            magazine_title: magazine.title.clone(),
                            published: item.published,
                            size: item.size,
                            issue_code: None,
                            issue_label: None,
                            issue_year: None,
                            issue_month: None,
                            issue_day: None,
                            issue_number: None,
                        };
                        if let Some(issue) = parser::parse_issue(
                            &result.title,
                            Some(&magazine.title),
                            magazine.language.as_deref().unwrap_or("en"),
                        ) {
                            result.attach_issue(&issue);
                        }
                        result
                    })
                    .collect();
                Some(results)
            }
            Err(e) => {
                tracing::warn!(
                    provider = %provider.name,
                    magazine = %magazine.title,
                    error = %e,
                    "provider search failed, dropping its results"
                );
                None
            }
        }
    }
}

#[async_trait]
impl ReleaseSearch for SearchService {
    async fn search_magazines(&self) -> Result<Vec<SearchResult>, ServiceError> {
        let providers: Vec<Provider> = ProviderRepository::list_enabled(&self.pool)
            .await?
            .into_iter()
            .filter(Provider::serves_magazines)
            .collect();
        let magazines = MagazineRepository::list_active(&self.pool).await?;

        if providers.is_empty() || magazines.is_empty() {
            return Ok(Vec::new());
        }

        let mut queries = Vec::new();
        for provider in &providers {
            for magazine in &magazines {
                queries.push(self.query_one(provider, magazine));
            }
        }

        let mut results: Vec<SearchResult> = join_all(queries)
            .await
            .into_iter()
            .flatten()
            .flatten()
            .collect();

        if self.max_age_days > 0 {
            let cutoff = Utc::now() - Duration::days(self.max_age_days);
            results.retain(|r| match r.published {
                Some(published) => published >= cutoff,
                None => true,
            });
        }

        sort_results(&mut results);
        Ok(results)
    }
}

/// Order results newest-first.
///
/// Parsed issue identity wins over the provider timestamp; results with
/// neither sort by bare issue number.
pub fn sort_results(results: &mut [SearchResult]) {
    results.sort_by_key(|r| std::cmp::Reverse(sort_key(r)));
}

fn sort_key(result: &SearchResult) -> (i32, i32, i32, i64, i64) {
    let ts = result.published.map(|p| p.timestamp()).unwrap_or(0);
    if let Some(year) = result.issue_year {
        (
            year,
            result.issue_month.unwrap_or(0),
            result.issue_day.unwrap_or(0),
            result.issue_number.unwrap_or(0),
            ts,
        )
    } else if let Some(published) = result.published {
        (
            published.year(),
            published.month() as i32,
            published.day() as i32,
            0,
            ts,
        )
    } else {
        (0, 0, 0, result.issue_number.unwrap_or(0), 0)
    }
}
