//! Progression gate
//!
//! Admission rule: a student may only queue for the belt exactly one rank
//! above their highest successful evaluation in that skill domain (or the
//! first belt when they have none). The achieved rank is derived from the
//! evaluation history on every check, never stored.
//!
//! Registration runs its read-then-insert inside one transaction; the
//! UNIQUE(student_id, skill_domain_id) constraint arbitrates concurrent
//! registrations. Conversion commits one transaction per entry and reports
//! per-entry outcomes instead of aborting the whole batch.

use beltline_common::db::models::{Belt, Evaluation, SkillDomain, WaitlistEntry};
use beltline_common::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

/// Verdict for one pending waitlist entry
#[derive(Debug, Clone, Deserialize)]
pub struct CompletedEvaluation {
    pub waitlist_entry_id: i64,
    pub date: NaiveDate,
    pub success: bool,
}

/// Per-entry outcome of a conversion batch
#[derive(Debug, Serialize)]
pub struct ConversionReport {
    pub converted: Vec<Evaluation>,
    pub failures: Vec<ConversionFailure>,
}

#[derive(Debug, Serialize)]
pub struct ConversionFailure {
    pub waitlist_entry_id: i64,
    pub error: String,
}

/// Highest-ranked belt with a successful evaluation for the pair, if any
pub async fn achieved_belt(
    conn: &mut SqliteConnection,
    student_id: i64,
    skill_domain_id: i64,
) -> Result<Option<Belt>> {
    Ok(sqlx::query_as::<_, Belt>(
        "SELECT b.* FROM belts b \
         JOIN evaluations e ON e.belt_id = b.id \
         WHERE e.student_id = ? AND e.skill_domain_id = ? AND e.success = 1 \
         ORDER BY b.rank DESC \
         LIMIT 1",
    )
    .bind(student_id)
    .bind(skill_domain_id)
    .fetch_optional(conn)
    .await?)
}

/// Check the admission rule for a requested belt against the achieved belt
pub fn check_admission(
    requested: &Belt,
    achieved: Option<&Belt>,
    skill_domain: &SkillDomain,
) -> Result<()> {
    match achieved {
        Some(achieved) => {
            if requested.rank > achieved.rank + 1 {
                return Err(Error::Conflict(format!(
                    "Registering for evaluation of {} (rank: {}) in {} but only reached {} (rank: {}) so far",
                    requested.name, requested.rank, skill_domain.name, achieved.name, achieved.rank
                )));
            }
            if requested.rank < achieved.rank + 1 {
                return Err(Error::Conflict(format!(
                    "Registering for evaluation of {} (rank: {}) in {} but already achieved {} (rank: {})",
                    requested.name, requested.rank, skill_domain.name, achieved.name, achieved.rank
                )));
            }
        }
        None => {
            if requested.rank > 1 {
                return Err(Error::Conflict(format!(
                    "Registering for evaluation of {} (rank: {}) in {} but no previous belt achieved yet",
                    requested.name, requested.rank, skill_domain.name
                )));
            }
        }
    }
    Ok(())
}

/// Register a student on the waitlist for a belt in a skill domain.
///
/// The caller has already handled authorization; referenced rows are checked
/// here so the admission read and the insert share one transaction.
pub async fn register_waitlist(
    pool: &SqlitePool,
    student_id: i64,
    belt_id: i64,
    skill_domain_id: i64,
) -> Result<WaitlistEntry> {
    let mut tx = pool.begin().await?;

    let student_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE id = ?)")
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;
    if !student_exists {
        return Err(Error::NotFound(format!("Student {} not found", student_id)));
    }

    let belt = sqlx::query_as::<_, Belt>("SELECT * FROM belts WHERE id = ?")
        .bind(belt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Belt {} not found", belt_id)))?;

    let skill_domain = sqlx::query_as::<_, SkillDomain>("SELECT * FROM skill_domains WHERE id = ?")
        .bind(skill_domain_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Skill domain {} not found", skill_domain_id)))?;

    let achieved = achieved_belt(&mut *tx, student_id, skill_domain_id).await?;
    check_admission(&belt, achieved.as_ref(), &skill_domain)?;

    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO waitlist_entries (student_id, skill_domain_id, belt_id) \
         VALUES (?, ?, ?) RETURNING id",
    )
    .bind(student_id)
    .bind(skill_domain_id)
    .bind(belt_id)
    .fetch_one(&mut *tx)
    .await;

    let entry_id = match inserted {
        Ok(id) => id,
        Err(e) => {
            let wrapped = Error::Database(e);
            if wrapped.is_unique_violation() {
                return Err(Error::Conflict(format!(
                    "Already existing waitlist entry for student {} and skill domain {}",
                    student_id, skill_domain_id
                )));
            }
            return Err(wrapped);
        }
    };

    let entry = sqlx::query_as::<_, WaitlistEntry>("SELECT * FROM waitlist_entries WHERE id = ?")
        .bind(entry_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(entry)
}

/// Convert pending waitlist entries into permanent evaluation records.
///
/// Each entry gets its own transaction: create the evaluation, delete the
/// entry, commit. A failed entry is reported and does not roll back entries
/// already converted.
pub async fn convert_waitlist(
    pool: &SqlitePool,
    completed: &[CompletedEvaluation],
) -> Result<ConversionReport> {
    let mut converted = Vec::new();
    let mut failures = Vec::new();

    for item in completed {
        let mut tx = pool.begin().await?;

        let entry = sqlx::query_as::<_, WaitlistEntry>(
            "SELECT * FROM waitlist_entries WHERE id = ?",
        )
        .bind(item.waitlist_entry_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(entry) = entry else {
            failures.push(ConversionFailure {
                waitlist_entry_id: item.waitlist_entry_id,
                error: format!("Waitlist entry {} not found", item.waitlist_entry_id),
            });
            continue;
        };

        let evaluation_id: i64 = sqlx::query_scalar(
            "INSERT INTO evaluations (student_id, skill_domain_id, belt_id, date, success) \
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(entry.student_id)
        .bind(entry.skill_domain_id)
        .bind(entry.belt_id)
        .bind(item.date)
        .bind(item.success)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM waitlist_entries WHERE id = ?")
            .bind(entry.id)
            .execute(&mut *tx)
            .await?;

        let evaluation = sqlx::query_as::<_, Evaluation>("SELECT * FROM evaluations WHERE id = ?")
            .bind(evaluation_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        converted.push(evaluation);
    }

    info!(
        converted = converted.len(),
        failed = failures.len(),
        "Converted waitlist entries"
    );

    Ok(ConversionReport { converted, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::append_belt;
    use beltline_common::db::init_memory_database;

    /// One student in one class, N belts, one skill domain
    async fn setup(belts: usize) -> SqlitePool {
        let pool = init_memory_database().await.unwrap();
        seed(&pool, belts).await;
        pool
    }

    async fn seed(pool: &SqlitePool, belts: usize) {
        sqlx::query("INSERT INTO users (username, password_hash, is_admin) VALUES ('s', 'x', 0)")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO levels (name) VALUES ('6e')")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO classes (level_id, name) VALUES (1, 'A')")
            .execute(pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO students (user_id, class_id, display_name, can_register_to_waitlist) \
             VALUES (1, 1, 'A Student', 1)",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO skill_domains (name, code) VALUES ('Algebra', 'D1')")
            .execute(pool)
            .await
            .unwrap();

        for i in 1..=belts {
            append_belt(pool, &format!("Belt {i}"), &format!("B{i}"), "#000")
                .await
                .unwrap();
        }
    }

    async fn record_success(pool: &SqlitePool, belt_id: i64) {
        sqlx::query(
            "INSERT INTO evaluations (student_id, skill_domain_id, belt_id, date, success) \
             VALUES (1, 1, ?, '2024-01-15', 1)",
        )
        .bind(belt_id)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn first_belt_allowed_without_history() {
        let pool = setup(3).await;

        let entry = register_waitlist(&pool, 1, 1, 1).await.unwrap();
        assert_eq!(entry.belt_id, 1);
        assert_eq!(entry.skill_domain_id, 1);
    }

    #[tokio::test]
    async fn higher_belt_rejected_without_history() {
        let pool = setup(3).await;

        let err = register_waitlist(&pool, 1, 2, 1).await.unwrap_err();
        match err {
            Error::Conflict(msg) => assert!(msg.contains("no previous belt achieved yet")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn only_next_belt_after_achieved_rank() {
        let pool = setup(5).await;
        record_success(&pool, 3).await;

        // rank 3 already achieved
        let err = register_waitlist(&pool, 1, 3, 1).await.unwrap_err();
        match err {
            Error::Conflict(msg) => assert!(msg.contains("already achieved")),
            other => panic!("unexpected error: {other:?}"),
        }

        // rank 5 is two steps ahead
        let err = register_waitlist(&pool, 1, 5, 1).await.unwrap_err();
        match err {
            Error::Conflict(msg) => assert!(msg.contains("so far")),
            other => panic!("unexpected error: {other:?}"),
        }

        // rank 4 is exactly the next one
        let entry = register_waitlist(&pool, 1, 4, 1).await.unwrap();
        assert_eq!(entry.belt_id, 4);
    }

    #[tokio::test]
    async fn achieved_rank_ignores_failed_evaluations() {
        let pool = setup(3).await;
        sqlx::query(
            "INSERT INTO evaluations (student_id, skill_domain_id, belt_id, date, success) \
             VALUES (1, 1, 1, '2024-01-15', 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        // a failed attempt at rank 1 does not unlock rank 2
        assert!(register_waitlist(&pool, 1, 2, 1).await.is_err());
        assert!(register_waitlist(&pool, 1, 1, 1).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let pool = setup(3).await;

        register_waitlist(&pool, 1, 1, 1).await.unwrap();

        // a pending entry does not change the achieved rank, so the second
        // request passes admission and is stopped by the constraint
        let err = register_waitlist(&pool, 1, 1, 1).await.unwrap_err();
        match err {
            Error::Conflict(msg) => assert!(msg.contains("Already existing waitlist entry")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_duplicate_registrations_exactly_one_wins() {
        // File-backed pool with multiple connections, so the two tasks run
        // real parallel transactions and the uniqueness constraint decides
        let dir = tempfile::tempdir().unwrap();
        let pool = beltline_common::db::init_database(&dir.path().join("race.db"))
            .await
            .unwrap();
        seed(&pool, 1).await;

        let first = tokio::spawn({
            let pool = pool.clone();
            async move { register_waitlist(&pool, 1, 1, 1).await }
        });
        let second = tokio::spawn({
            let pool = pool.clone();
            async move { register_waitlist(&pool, 1, 1, 1).await }
        });

        let first = first.await.unwrap();
        let second = second.await.unwrap();

        assert!(
            first.is_ok() != second.is_ok(),
            "expected exactly one registration to win: {first:?} / {second:?}"
        );

        let entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist_entries")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn missing_references_are_not_found() {
        let pool = setup(1).await;

        assert!(matches!(
            register_waitlist(&pool, 99, 1, 1).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            register_waitlist(&pool, 1, 99, 1).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            register_waitlist(&pool, 1, 1, 99).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn conversion_creates_evaluation_and_removes_entry() {
        let pool = setup(2).await;
        let entry = register_waitlist(&pool, 1, 1, 1).await.unwrap();

        let report = convert_waitlist(
            &pool,
            &[CompletedEvaluation {
                waitlist_entry_id: entry.id,
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                success: true,
            }],
        )
        .await
        .unwrap();

        assert_eq!(report.converted.len(), 1);
        assert!(report.failures.is_empty());

        let evaluation = &report.converted[0];
        assert_eq!(evaluation.student_id, 1);
        assert_eq!(evaluation.belt_id, 1);
        assert_eq!(evaluation.skill_domain_id, 1);
        assert!(evaluation.success);
        assert_eq!(evaluation.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist_entries")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);

        let evaluations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM evaluations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(evaluations, 1);
    }

    #[tokio::test]
    async fn conversion_reports_missing_entries_without_losing_others() {
        let pool = setup(2).await;
        let entry = register_waitlist(&pool, 1, 1, 1).await.unwrap();

        let report = convert_waitlist(
            &pool,
            &[
                CompletedEvaluation {
                    waitlist_entry_id: 999,
                    date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                    success: true,
                },
                CompletedEvaluation {
                    waitlist_entry_id: entry.id,
                    date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                    success: false,
                },
            ],
        )
        .await
        .unwrap();

        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].waitlist_entry_id, 999);
    }

    #[tokio::test]
    async fn failed_conversion_allows_immediate_reregistration() {
        let pool = setup(2).await;
        let entry = register_waitlist(&pool, 1, 1, 1).await.unwrap();

        convert_waitlist(
            &pool,
            &[CompletedEvaluation {
                waitlist_entry_id: entry.id,
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                success: false,
            }],
        )
        .await
        .unwrap();

        // achieved rank is unchanged; the same belt is still the next one
        let entry = register_waitlist(&pool, 1, 1, 1).await.unwrap();
        assert_eq!(entry.belt_id, 1);
    }
}
