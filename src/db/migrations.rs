//! Database migrations
//!
//! Migrations are embedded in the binary as SQL strings, one dialect per
//! backend. Each applied migration is recorded in `_migrations` so that
//! `run_migrations` is idempotent.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, SqlitePool};
use std::time::Duration;

use super::{Backend, DynDatabasePool};
use crate::config::DatabaseDriver;

/// A database migration with SQL for both Postgres and SQLite
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for Postgres
    pub up_postgres: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// All blog migrations, in order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_authors",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(200) NOT NULL,
                email VARCHAR(255),
                picture TEXT,
                bio TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_postgres: r#"
            CREATE TABLE IF NOT EXISTS authors (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(200) NOT NULL,
                email VARCHAR(255),
                picture TEXT,
                bio TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_blog_posts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(255) NOT NULL,
                title VARCHAR(500) NOT NULL,
                excerpt TEXT,
                content TEXT NOT NULL,
                cover_image TEXT,
                published BOOLEAN NOT NULL DEFAULT 0,
                locale VARCHAR(16) NOT NULL DEFAULT 'en',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                published_at TIMESTAMP,
                UNIQUE (slug, locale)
            );
            CREATE INDEX IF NOT EXISTS idx_blog_posts_listing ON blog_posts(locale, published, published_at);
        "#,
        up_postgres: r#"
            CREATE TABLE IF NOT EXISTS blog_posts (
                id BIGSERIAL PRIMARY KEY,
                slug VARCHAR(255) NOT NULL,
                title VARCHAR(500) NOT NULL,
                excerpt TEXT,
                content TEXT NOT NULL,
                cover_image TEXT,
                published BOOLEAN NOT NULL DEFAULT FALSE,
                locale VARCHAR(16) NOT NULL DEFAULT 'en',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                published_at TIMESTAMPTZ,
                UNIQUE (slug, locale)
            );
            CREATE INDEX IF NOT EXISTS idx_blog_posts_listing ON blog_posts(locale, published, published_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_blog_post_authors",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_post_authors (
                post_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (post_id, author_id),
                FOREIGN KEY (post_id) REFERENCES blog_posts(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_blog_post_authors_author ON blog_post_authors(author_id);
        "#,
        up_postgres: r#"
            CREATE TABLE IF NOT EXISTS blog_post_authors (
                post_id BIGINT NOT NULL REFERENCES blog_posts(id) ON DELETE CASCADE,
                author_id BIGINT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                position INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (post_id, author_id)
            );
            CREATE INDEX IF NOT EXISTS idx_blog_post_authors_author ON blog_post_authors(author_id);
        "#,
    },
    Migration {
        version: 4,
        name: "create_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                slug VARCHAR(100) NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS blog_post_tags (
                post_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (post_id, tag_id),
                FOREIGN KEY (post_id) REFERENCES blog_posts(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );
        "#,
        up_postgres: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                slug VARCHAR(100) NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS blog_post_tags (
                post_id BIGINT NOT NULL REFERENCES blog_posts(id) ON DELETE CASCADE,
                tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (post_id, tag_id)
            );
        "#,
    },
];

/// Run all pending migrations. Returns the number applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;
    for migration in MIGRATIONS {
        if applied_versions.contains(&(migration.version as i64)) {
            continue;
        }
        tracing::info!(
            "Applying migration {}: {}",
            migration.version,
            migration.name
        );
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Postgres => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.backend() {
        Backend::Sqlite(pool) => get_applied_migrations_sqlite(pool).await,
        Backend::Postgres(pool) => get_applied_migrations_postgres(pool).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    rows.iter()
        .map(|row| {
            Ok(MigrationRecord {
                version: row.try_get("version")?,
                name: row.try_get("name")?,
                applied_at: row.try_get("applied_at")?,
            })
        })
        .collect()
}

async fn get_applied_migrations_postgres(pool: &PgPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    rows.iter()
        .map(|row| {
            Ok(MigrationRecord {
                version: row.try_get("version")?,
                name: row.try_get("name")?,
                applied_at: row.try_get("applied_at")?,
            })
        })
        .collect()
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.backend() {
        Backend::Sqlite(pool) => apply_migration_sqlite(pool, migration).await,
        Backend::Postgres(pool) => apply_migration_postgres(pool, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version as i64)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

async fn apply_migration_postgres(pool: &PgPool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await?;
    for statement in split_sql_statements(migration.up_postgres) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES ($1, $2)")
        .bind(migration.version as i64)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, dropping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Run pending migrations, giving up after `timeout`
pub async fn run_migrations_within(pool: &DynDatabasePool, timeout: Duration) -> Result<usize> {
    let migrate = async {
        let pending = pending_count(pool).await?;
        if pending > 0 {
            tracing::info!("Applying {} pending migrations", pending);
        }
        run_migrations(pool).await
    };
    match tokio::time::timeout(timeout, migrate).await {
        Ok(result) => result,
        Err(_) => bail!("Migrations timed out after {:?}", timeout),
    }
}

/// Retry migrations every `interval` until one attempt succeeds.
///
/// Returns the number of migrations the successful attempt applied.
pub async fn retry_migrations(pool: DynDatabasePool, interval: Duration, timeout: Duration) -> usize {
    let mut attempt: u32 = 1;
    loop {
        tokio::time::sleep(interval).await;
        attempt += 1;
        match run_migrations_within(&pool, timeout).await {
            Ok(applied) => {
                tracing::info!(
                    "Database migrations succeeded on attempt {} ({} applied)",
                    attempt,
                    applied
                );
                return applied;
            }
            Err(e) => tracing::warn!("Database migrations attempt {} failed: {:#}", attempt, e),
        }
    }
}
