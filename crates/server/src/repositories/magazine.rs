use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{CreateMagazine, Magazine};

const SELECT_MAGAZINE: &str = r#"
    SELECT
        id, title, search_term, language, status,
        auto_since_year, auto_since_issue, created_at
    FROM magazine
"#;

pub struct MagazineRepository;

impl MagazineRepository {
    pub async fn create(
        pool: &SqlitePool,
        data: CreateMagazine,
    ) -> Result<Magazine, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO magazine (title, search_term, language, auto_since_year, auto_since_issue)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&data.title)
        .bind(&data.search_term)
        .bind(&data.language)
        .bind(data.auto_since_year)
        .bind(data.auto_since_issue)
        .execute(pool)
        .await?;

        Self::get_by_id(pool, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Magazine>, sqlx::Error> {
        let query = format!("{} WHERE id = $1", SELECT_MAGAZINE);
        let row = sqlx::query_as::<_, MagazineRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Magazine>, sqlx::Error> {
        let query = format!("{} ORDER BY title ASC", SELECT_MAGAZINE);
        let rows = sqlx::query_as::<_, MagazineRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Magazines that should be searched
    pub async fn list_active(pool: &SqlitePool) -> Result<Vec<Magazine>, sqlx::Error> {
        let query = format!(
            "{} WHERE LOWER(status) = 'active' ORDER BY title ASC",
            SELECT_MAGAZINE
        );
        let rows = sqlx::query_as::<_, MagazineRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MagazineRow {
    id: i64,
    title: String,
    search_term: Option<String>,
    language: Option<String>,
    status: String,
    auto_since_year: Option<i32>,
    auto_since_issue: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<MagazineRow> for Magazine {
    fn from(row: MagazineRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            search_term: row.search_term,
            language: row.language,
            status: row.status,
            auto_since_year: row.auto_since_year,
            auto_since_issue: row.auto_since_issue,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    #[tokio::test]
    async fn test_create_and_list_active() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        let mag = MagazineRepository::create(
            &pool,
            CreateMagazine {
                title: "PC Gamer".to_string(),
                search_term: None,
                language: Some("en".to_string()),
                auto_since_year: Some(2024),
                auto_since_issue: Some(5),
            },
        )
        .await
        .unwrap();

        assert!(mag.is_active(), "new magazines default to Active");
        assert_eq!(mag.query_term(), "PC Gamer");

        let active = MagazineRepository::list_active(&pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].auto_since_issue, Some(5));
    }
}
