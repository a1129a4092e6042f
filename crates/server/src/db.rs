use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_pool_with_connections(database_url, 5).await
}

pub async fn create_pool_with_connections(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provider (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            base_url TEXT NOT NULL,
            api_key TEXT NOT NULL DEFAULT '',
            enabled BOOLEAN NOT NULL DEFAULT TRUE,
            download_types TEXT NOT NULL DEFAULT 'M',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS magazine (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            search_term TEXT,
            language TEXT,
            status TEXT NOT NULL DEFAULT 'Active',
            auto_since_year INTEGER,
            auto_since_issue INTEGER,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS download_job (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            engine_id TEXT,
            title TEXT NOT NULL,
            magazine_title TEXT,
            link TEXT,
            content_name TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            engine_status TEXT,
            progress REAL NOT NULL DEFAULT 0.0,
            time_remaining TEXT,
            message TEXT,
            clean_name TEXT,
            staging_path TEXT,
            issue_code TEXT,
            issue_label TEXT,
            issue_year INTEGER,
            issue_month INTEGER,
            issue_number INTEGER,
            last_seen DATETIME,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            completed_at DATETIME,
            moved_at DATETIME
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
