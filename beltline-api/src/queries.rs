//! Explicit query functions, one per access pattern
//!
//! Lookups return `NotFound` with a caller-facing message naming the missing
//! resource; list queries return plain row structs.

use beltline_common::db::models::{
    Belt, ClassGroup, Evaluation, Level, SkillDomain, Student, User, WaitlistEntry,
};
use beltline_common::{Error, Result};
use sqlx::SqlitePool;

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    Ok(
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
        .fetch_all(pool)
        .await?)
}

pub async fn get_level(pool: &SqlitePool, level_id: i64) -> Result<Level> {
    sqlx::query_as::<_, Level>("SELECT * FROM levels WHERE id = ?")
        .bind(level_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Level {} not found", level_id)))
}

pub async fn list_levels(pool: &SqlitePool) -> Result<Vec<Level>> {
    Ok(sqlx::query_as::<_, Level>("SELECT * FROM levels ORDER BY name")
        .fetch_all(pool)
        .await?)
}

pub async fn get_class(pool: &SqlitePool, class_id: i64) -> Result<ClassGroup> {
    sqlx::query_as::<_, ClassGroup>("SELECT * FROM classes WHERE id = ?")
        .bind(class_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Class {} not found", class_id)))
}

pub async fn list_classes_of_level(pool: &SqlitePool, level_id: i64) -> Result<Vec<ClassGroup>> {
    Ok(
        sqlx::query_as::<_, ClassGroup>("SELECT * FROM classes WHERE level_id = ? ORDER BY name")
            .bind(level_id)
            .fetch_all(pool)
            .await?,
    )
}

pub async fn get_student(pool: &SqlitePool, student_id: i64) -> Result<Student> {
    sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Student {} not found", student_id)))
}

/// Student record attached to a user account, if the user is a student
pub async fn get_student_of_user(pool: &SqlitePool, user_id: i64) -> Result<Option<Student>> {
    Ok(
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn list_students_of_class(pool: &SqlitePool, class_id: i64) -> Result<Vec<Student>> {
    Ok(sqlx::query_as::<_, Student>(
        "SELECT * FROM students WHERE class_id = ? ORDER BY rank, display_name",
    )
    .bind(class_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_belt(pool: &SqlitePool, belt_id: i64) -> Result<Belt> {
    sqlx::query_as::<_, Belt>("SELECT * FROM belts WHERE id = ?")
        .bind(belt_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Belt {} not found", belt_id)))
}

pub async fn list_belts(pool: &SqlitePool) -> Result<Vec<Belt>> {
    Ok(sqlx::query_as::<_, Belt>("SELECT * FROM belts ORDER BY rank")
        .fetch_all(pool)
        .await?)
}

pub async fn get_skill_domain(pool: &SqlitePool, skill_domain_id: i64) -> Result<SkillDomain> {
    sqlx::query_as::<_, SkillDomain>("SELECT * FROM skill_domains WHERE id = ?")
        .bind(skill_domain_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Skill domain {} not found", skill_domain_id)))
}

pub async fn list_skill_domains(pool: &SqlitePool) -> Result<Vec<SkillDomain>> {
    Ok(
        sqlx::query_as::<_, SkillDomain>("SELECT * FROM skill_domains ORDER BY name")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn get_evaluation(pool: &SqlitePool, evaluation_id: i64) -> Result<Evaluation> {
    sqlx::query_as::<_, Evaluation>("SELECT * FROM evaluations WHERE id = ?")
        .bind(evaluation_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Evaluation {} not found", evaluation_id)))
}

/// Full evaluation history of one student, oldest first
pub async fn list_evaluations_of_student(
    pool: &SqlitePool,
    student_id: i64,
) -> Result<Vec<Evaluation>> {
    Ok(sqlx::query_as::<_, Evaluation>(
        "SELECT * FROM evaluations WHERE student_id = ? ORDER BY date, id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?)
}

/// Successful evaluations for every student of a class; used to display each
/// student's achieved belts per skill domain
pub async fn list_successful_evaluations_of_class(
    pool: &SqlitePool,
    class_id: i64,
) -> Result<Vec<Evaluation>> {
    Ok(sqlx::query_as::<_, Evaluation>(
        "SELECT e.* FROM evaluations e \
         JOIN students s ON s.id = e.student_id \
         WHERE s.class_id = ? AND e.success = 1 \
         ORDER BY e.student_id, e.skill_domain_id",
    )
    .bind(class_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_waitlist_entry(pool: &SqlitePool, waitlist_id: i64) -> Result<WaitlistEntry> {
    sqlx::query_as::<_, WaitlistEntry>("SELECT * FROM waitlist_entries WHERE id = ?")
        .bind(waitlist_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Waitlist entry {} not found", waitlist_id)))
}

pub async fn list_waitlist_of_student(
    pool: &SqlitePool,
    student_id: i64,
) -> Result<Vec<WaitlistEntry>> {
    Ok(sqlx::query_as::<_, WaitlistEntry>(
        "SELECT * FROM waitlist_entries WHERE student_id = ? ORDER BY id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?)
}

/// All pending entries of a class's students, ordered so callers can group
/// them by student
pub async fn list_waitlist_of_class(
    pool: &SqlitePool,
    class_id: i64,
) -> Result<Vec<WaitlistEntry>> {
    Ok(sqlx::query_as::<_, WaitlistEntry>(
        "SELECT w.* FROM waitlist_entries w \
         JOIN students s ON s.id = w.student_id \
         WHERE s.class_id = ? \
         ORDER BY w.student_id, w.id",
    )
    .bind(class_id)
    .fetch_all(pool)
    .await?)
}
