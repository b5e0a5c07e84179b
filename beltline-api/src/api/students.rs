//! Student management, progress history, and waitlist registration

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use beltline_common::auth::hash_password;
use beltline_common::db::models::{
    Belt, ClassGroup, Evaluation, Level, SkillDomain, Student, User, WaitlistEntry,
};
use beltline_common::Error;
use serde::{Deserialize, Serialize};

use crate::api::auth::{authorize, require_admin, Me};
use crate::api::ApiResult;
use crate::{progression, queries, AppState};

#[derive(Debug, Serialize)]
pub struct StudentOne {
    pub student: Student,
    pub user: User,
}

/// Student with their complete evaluation history
#[derive(Debug, Serialize)]
pub struct StudentDetail {
    pub level: Level,
    pub class: ClassGroup,
    pub student: Student,
    pub belts: Vec<Belt>,
    pub skill_domains: Vec<SkillDomain>,
    pub evaluations: Vec<Evaluation>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub class_id: i64,
    pub display_name: String,
    pub rank: i64,
    pub username: String,
    pub password: String,
}

/// POST /students
///
/// Creates the login account and the student record together; a duplicate
/// username rolls back both.
pub async fn create(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<CreateStudentRequest>,
) -> ApiResult<Json<StudentOne>> {
    require_admin(&me)?;
    queries::get_class(&state.db, request.class_id).await?;

    let mut tx = state.db.begin().await.map_err(Error::Database)?;

    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, password_hash, is_admin) VALUES (?, ?, 0) RETURNING id",
    )
    .bind(&request.username)
    .bind(hash_password(&request.password))
    .fetch_one(&mut *tx)
    .await;

    let user_id = match inserted {
        Ok(id) => id,
        Err(e) => {
            let wrapped = Error::Database(e);
            if wrapped.is_unique_violation() {
                return Err(Error::Conflict(format!(
                    "User with username \"{}\" already exists",
                    request.username
                ))
                .into());
            }
            return Err(wrapped.into());
        }
    };

    let student_id: i64 = sqlx::query_scalar(
        "INSERT INTO students (user_id, class_id, display_name, rank) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(user_id)
    .bind(request.class_id)
    .bind(&request.display_name)
    .bind(request.rank)
    .fetch_one(&mut *tx)
    .await
    .map_err(Error::Database)?;

    tx.commit().await.map_err(Error::Database)?;

    let student = queries::get_student(&state.db, student_id).await?;
    let user = queries::get_user(&state.db, user_id).await?;
    Ok(Json(StudentOne { student, user }))
}

#[derive(Debug, Deserialize)]
pub struct BulkStudentUpdate {
    pub id: i64,
    pub rank: Option<i64>,
    pub can_register_to_waitlist: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    pub students: Vec<BulkStudentUpdate>,
}

/// PUT /students
///
/// Roster-wide edit of display attributes, applied atomically.
pub async fn bulk_update(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<BulkUpdateRequest>,
) -> ApiResult<StatusCode> {
    require_admin(&me)?;

    let mut tx = state.db.begin().await.map_err(Error::Database)?;

    for item in &request.students {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
            .bind(item.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("Student {} not found", item.id)))?;

        let rank = item.rank.unwrap_or(student.rank);
        let can_register = item
            .can_register_to_waitlist
            .unwrap_or(student.can_register_to_waitlist);

        sqlx::query("UPDATE students SET rank = ?, can_register_to_waitlist = ? WHERE id = ?")
            .bind(rank)
            .bind(can_register)
            .bind(item.id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
    }

    tx.commit().await.map_err(Error::Database)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /students/:student_id
///
/// Students may view their own history; anyone else needs admin.
pub async fn get(
    State(state): State<AppState>,
    me: Me,
    Path(student_id): Path<i64>,
) -> ApiResult<Json<StudentDetail>> {
    authorize(&me, me.student.as_ref().is_some_and(|s| s.id == student_id))?;

    let student = queries::get_student(&state.db, student_id).await?;
    let class = queries::get_class(&state.db, student.class_id).await?;
    let level = queries::get_level(&state.db, class.level_id).await?;
    let belts = queries::list_belts(&state.db).await?;
    let skill_domains = queries::list_skill_domains(&state.db).await?;
    let evaluations = queries::list_evaluations_of_student(&state.db, student_id).await?;

    Ok(Json(StudentDetail {
        level,
        class,
        student,
        belts,
        skill_domains,
        evaluations,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStudentRequest {
    pub class_id: Option<i64>,
    pub display_name: Option<String>,
    pub rank: Option<i64>,
    pub can_register_to_waitlist: Option<bool>,
}

/// PUT /students/:student_id
pub async fn update(
    State(state): State<AppState>,
    me: Me,
    Path(student_id): Path<i64>,
    Json(request): Json<UpdateStudentRequest>,
) -> ApiResult<Json<StudentOne>> {
    require_admin(&me)?;
    let student = queries::get_student(&state.db, student_id).await?;

    let class_id = match request.class_id {
        Some(class_id) => {
            queries::get_class(&state.db, class_id).await?;
            class_id
        }
        None => student.class_id,
    };
    let display_name = request.display_name.unwrap_or(student.display_name);
    let rank = request.rank.unwrap_or(student.rank);
    let can_register = request
        .can_register_to_waitlist
        .unwrap_or(student.can_register_to_waitlist);

    sqlx::query(
        "UPDATE students SET class_id = ?, display_name = ?, rank = ?, \
         can_register_to_waitlist = ? WHERE id = ?",
    )
    .bind(class_id)
    .bind(&display_name)
    .bind(rank)
    .bind(can_register)
    .bind(student_id)
    .execute(&state.db)
    .await
    .map_err(Error::Database)?;

    let student = queries::get_student(&state.db, student_id).await?;
    let user = queries::get_user(&state.db, student.user_id).await?;
    Ok(Json(StudentOne { student, user }))
}

/// DELETE /students/:student_id
///
/// Removes the login account; the student row and its evaluations and
/// waitlist entries follow through the foreign keys.
pub async fn remove(
    State(state): State<AppState>,
    me: Me,
    Path(student_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&me)?;
    let student = queries::get_student(&state.db, student_id).await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(student.user_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct StudentWaitlist {
    pub student: Student,
    pub waitlist_entries: Vec<WaitlistEntry>,
}

/// GET /students/:student_id/waitlist
pub async fn waitlist(
    State(state): State<AppState>,
    me: Me,
    Path(student_id): Path<i64>,
) -> ApiResult<Json<StudentWaitlist>> {
    authorize(&me, me.student.as_ref().is_some_and(|s| s.id == student_id))?;

    let student = queries::get_student(&state.db, student_id).await?;
    let waitlist_entries = queries::list_waitlist_of_student(&state.db, student_id).await?;
    Ok(Json(StudentWaitlist {
        student,
        waitlist_entries,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterWaitlistRequest {
    pub belt_id: i64,
    pub skill_domain_id: i64,
}

#[derive(Debug, Serialize)]
pub struct WaitlistEntryOne {
    pub waitlist_entry: WaitlistEntry,
}

/// POST /students/:student_id/waitlist
///
/// Students may register themselves while their registration flag is set;
/// admins may register anyone.
pub async fn register_waitlist(
    State(state): State<AppState>,
    me: Me,
    Path(student_id): Path<i64>,
    Json(request): Json<RegisterWaitlistRequest>,
) -> ApiResult<Json<WaitlistEntryOne>> {
    authorize(
        &me,
        me.student
            .as_ref()
            .is_some_and(|s| s.id == student_id && s.can_register_to_waitlist),
    )?;

    let waitlist_entry = progression::register_waitlist(
        &state.db,
        student_id,
        request.belt_id,
        request.skill_domain_id,
    )
    .await?;

    Ok(Json(WaitlistEntryOne { waitlist_entry }))
}
