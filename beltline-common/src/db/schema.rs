//! Table definitions
//!
//! All statements are `CREATE TABLE IF NOT EXISTS` so a restart against an
//! existing database is a no-op.

use crate::Result;
use sqlx::SqlitePool;

/// Create every table and index, in dependency order
pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_levels_table(pool).await?;
    create_classes_table(pool).await?;
    create_students_table(pool).await?;
    create_belts_table(pool).await?;
    create_skill_domains_table(pool).await?;
    create_evaluations_table(pool).await?;
    create_waitlist_entries_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            last_login TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_levels_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS levels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_classes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS classes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            level_id INTEGER NOT NULL REFERENCES levels(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_classes_level ON classes(level_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            class_id INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
            display_name TEXT NOT NULL,
            rank INTEGER NOT NULL DEFAULT 0,
            can_register_to_waitlist INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_belts_table(pool: &SqlitePool) -> Result<()> {
    // rank is written only by the rank ledger; it stays a dense 1..N permutation
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS belts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            rank INTEGER NOT NULL,
            name TEXT NOT NULL,
            code TEXT NOT NULL DEFAULT '',
            color TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_belts_rank ON belts(rank)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_skill_domains_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS skill_domains (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            name TEXT NOT NULL,
            code TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_evaluations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS evaluations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            skill_domain_id INTEGER NOT NULL REFERENCES skill_domains(id) ON DELETE CASCADE,
            belt_id INTEGER NOT NULL REFERENCES belts(id) ON DELETE CASCADE,
            date TEXT NOT NULL DEFAULT CURRENT_DATE,
            success INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_evaluations_student_domain \
         ON evaluations(student_id, skill_domain_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_waitlist_entries_table(pool: &SqlitePool) -> Result<()> {
    // UNIQUE(student_id, skill_domain_id): at most one pending registration
    // per student and domain, regardless of belt. Concurrent registrations
    // are arbitrated by this constraint.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS waitlist_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            skill_domain_id INTEGER NOT NULL REFERENCES skill_domains(id) ON DELETE CASCADE,
            belt_id INTEGER NOT NULL REFERENCES belts(id) ON DELETE CASCADE,
            last_printed TEXT,
            UNIQUE(student_id, skill_domain_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_waitlist_entries_student \
         ON waitlist_entries(student_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
