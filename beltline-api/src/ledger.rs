//! Rank ledger
//!
//! Maintains the dense total order of belts: ranks always form the exact set
//! `1..=N` with no gaps or duplicates. Every mutation runs in a single
//! transaction so a concurrent reader never observes a partial renumbering,
//! and bound checks read the current state inside that same transaction.

use beltline_common::db::models::Belt;
use beltline_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};

/// Create a belt at the end of the ladder (`max(rank) + 1`, or 1 when empty)
pub async fn append_belt(pool: &SqlitePool, name: &str, code: &str, color: &str) -> Result<Belt> {
    let mut tx = pool.begin().await?;

    let max_rank: Option<i64> = sqlx::query_scalar("SELECT MAX(rank) FROM belts")
        .fetch_one(&mut *tx)
        .await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO belts (rank, name, code, color) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(max_rank.unwrap_or(0) + 1)
    .bind(name)
    .bind(code)
    .bind(color)
    .fetch_one(&mut *tx)
    .await?;

    let belt = fetch_belt(&mut *tx, id).await?;
    tx.commit().await?;
    Ok(belt)
}

/// Remove a belt and close the gap: every rank above it decrements by one
pub async fn delete_belt(pool: &SqlitePool, belt_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    let belt = fetch_belt(&mut *tx, belt_id).await?;

    sqlx::query("UPDATE belts SET rank = rank - 1 WHERE rank > ?")
        .bind(belt.rank)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM belts WHERE id = ?")
        .bind(belt.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Exchange the ranks of two belts; no other belt moves
pub async fn swap_belts(pool: &SqlitePool, belt_id: i64, other_belt_id: i64) -> Result<Belt> {
    let mut tx = pool.begin().await?;

    let belt = fetch_belt(&mut *tx, belt_id).await?;
    let other = fetch_belt(&mut *tx, other_belt_id).await?;

    sqlx::query("UPDATE belts SET rank = ? WHERE id = ?")
        .bind(other.rank)
        .bind(belt.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE belts SET rank = ? WHERE id = ?")
        .bind(belt.rank)
        .bind(other.id)
        .execute(&mut *tx)
        .await?;

    let updated = fetch_belt(&mut *tx, belt_id).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Move one belt by `delta` positions; the belts in between shift the other
/// way by exactly one, preserving density. `delta == 0` is a no-op.
pub async fn shift_belt(pool: &SqlitePool, belt_id: i64, delta: i64) -> Result<Belt> {
    let mut tx = pool.begin().await?;

    let belt = fetch_belt(&mut *tx, belt_id).await?;
    let target = belt.rank + delta;

    if delta < 0 {
        if target < 1 {
            return Err(Error::BadRequest(format!(
                "Cannot decrease rank of belt {} by {}",
                belt_id, -delta
            )));
        }
        sqlx::query("UPDATE belts SET rank = rank + 1 WHERE ? <= rank AND rank < ?")
            .bind(target)
            .bind(belt.rank)
            .execute(&mut *tx)
            .await?;
    } else if delta > 0 {
        let max_rank: i64 = sqlx::query_scalar("SELECT MAX(rank) FROM belts")
            .fetch_one(&mut *tx)
            .await?;
        if target > max_rank {
            return Err(Error::BadRequest(format!(
                "Cannot increase rank of belt {} by {}",
                belt_id, delta
            )));
        }
        sqlx::query("UPDATE belts SET rank = rank - 1 WHERE ? < rank AND rank <= ?")
            .bind(belt.rank)
            .bind(target)
            .execute(&mut *tx)
            .await?;
    } else {
        return Ok(belt);
    }

    sqlx::query("UPDATE belts SET rank = ? WHERE id = ?")
        .bind(target)
        .bind(belt.id)
        .execute(&mut *tx)
        .await?;

    let updated = fetch_belt(&mut *tx, belt_id).await?;
    tx.commit().await?;
    Ok(updated)
}

async fn fetch_belt(conn: &mut SqliteConnection, belt_id: i64) -> Result<Belt> {
    sqlx::query_as::<_, Belt>("SELECT * FROM belts WHERE id = ?")
        .bind(belt_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Belt {} not found", belt_id)))
}
