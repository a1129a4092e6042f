use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{CreateProvider, Provider};

const SELECT_PROVIDER: &str = r#"
    SELECT
        id, name, base_url, api_key, enabled, download_types, created_at
    FROM provider
"#;

pub struct ProviderRepository;

impl ProviderRepository {
    pub async fn create(
        pool: &SqlitePool,
        data: CreateProvider,
    ) -> Result<Provider, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO provider (name, base_url, api_key, enabled, download_types)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&data.name)
        .bind(&data.base_url)
        .bind(&data.api_key)
        .bind(data.enabled.unwrap_or(true))
        .bind(data.download_types.as_deref().unwrap_or("M"))
        .execute(pool)
        .await?;

        Self::get_by_id(pool, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Provider>, sqlx::Error> {
        let query = format!("{} WHERE id = $1", SELECT_PROVIDER);
        let row = sqlx::query_as::<_, ProviderRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Provider>, sqlx::Error> {
        let query = format!("{} ORDER BY name ASC", SELECT_PROVIDER);
        let rows = sqlx::query_as::<_, ProviderRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_enabled(pool: &SqlitePool) -> Result<Vec<Provider>, sqlx::Error> {
        let query = format!("{} WHERE enabled = TRUE ORDER BY name ASC", SELECT_PROVIDER);
        let rows = sqlx::query_as::<_, ProviderRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProviderRow {
    id: i64,
    name: String,
    base_url: String,
    api_key: String,
    enabled: bool,
    download_types: String,
    created_at: DateTime<Utc>,
}

impl From<ProviderRow> for Provider {
    fn from(row: ProviderRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            base_url: row.base_url,
            api_key: row.api_key,
            enabled: row.enabled,
            download_types: row.download_types,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    #[tokio::test]
    async fn test_serves_magazines_needs_enabled_and_type() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let p = ProviderRepository::create(
            &pool,
            CreateProvider {
                name: "indexer".to_string(),
                base_url: "https://indexer.example".to_string(),
                api_key: "k".to_string(),
                enabled: Some(true),
                download_types: Some("EM".to_string()),
            },
        )
        .await
        .unwrap();
        assert!(p.serves_magazines());

        let q = ProviderRepository::create(
            &pool,
            CreateProvider {
                name: "books-only".to_string(),
                base_url: "https://books.example".to_string(),
                api_key: "k".to_string(),
                enabled: Some(true),
                download_types: Some("E".to_string()),
            },
        )
        .await
        .unwrap();
        assert!(!q.serves_magazines());

        let enabled = ProviderRepository::list_enabled(&pool).await.unwrap();
        assert_eq!(enabled.len(), 2);
    }
}
