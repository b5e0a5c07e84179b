//! Database bootstrap and access layer
//!
//! Creates the database on first run and brings the schema up to date
//! idempotently; every service start runs through the same path.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub mod models;
mod schema;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys (off by default in SQLite)
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while a renumbering transaction writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    schema::create_all_tables(&pool).await?;

    Ok(pool)
}

/// Initialize an in-memory database with the full schema.
///
/// The pool is capped at a single connection so that every query sees the
/// same in-memory database. Used by tests and suitable for demos.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    schema::create_all_tables(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("beltline.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        // Schema is in place
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM belts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("beltline.db");

        init_database(&db_path).await.unwrap();
        init_database(&db_path).await.unwrap();
    }

    #[tokio::test]
    async fn waitlist_uniqueness_constraint_enforced() {
        let pool = init_memory_database().await.unwrap();

        sqlx::query("INSERT INTO users (username, password_hash, is_admin) VALUES ('a', 'x', 0)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO levels (name) VALUES ('6e')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO classes (level_id, name) VALUES (1, 'A')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO students (user_id, class_id, display_name, can_register_to_waitlist) \
             VALUES (1, 1, 'A Student', 1)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO belts (rank, name, code, color) VALUES (1, 'White', 'W', '#fff')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO skill_domains (name, code) VALUES ('Algebra', 'D1')")
            .execute(&pool)
            .await
            .unwrap();

        let insert = "INSERT INTO waitlist_entries (student_id, skill_domain_id, belt_id) \
                      VALUES (1, 1, 1)";
        sqlx::query(insert).execute(&pool).await.unwrap();

        let err = sqlx::query(insert).execute(&pool).await.unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }
}
