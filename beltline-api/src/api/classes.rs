//! Class management and class-wide progress views

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use beltline_common::db::models::{Belt, ClassGroup, Level, SkillDomain, Student, WaitlistEntry};
use beltline_common::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::auth::{authorize, require_admin, Me};
use crate::api::ApiResult;
use crate::{queries, AppState};

#[derive(Debug, Serialize)]
pub struct ClassOne {
    pub level: Level,
    pub class: ClassGroup,
}

/// One achieved belt of a student, per skill domain
#[derive(Debug, Serialize)]
pub struct StudentBelt {
    pub skill_domain_id: i64,
    pub belt_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StudentBelts {
    pub student_id: i64,
    pub belts: Vec<StudentBelt>,
}

/// Class roster with every student's successful evaluations
#[derive(Debug, Serialize)]
pub struct ClassDetail {
    pub level: Level,
    pub class: ClassGroup,
    pub belts: Vec<Belt>,
    pub skill_domains: Vec<SkillDomain>,
    pub students: Vec<Student>,
    pub student_belts: Vec<StudentBelts>,
}

#[derive(Debug, Serialize)]
pub struct WaitlistMapping {
    pub student_id: i64,
    pub waitlist_entries: Vec<WaitlistEntry>,
}

#[derive(Debug, Serialize)]
pub struct WaitlistMappingList {
    pub waitlist_mappings: Vec<WaitlistMapping>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub level_id: i64,
    pub name: String,
}

/// POST /classes
pub async fn create(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<CreateClassRequest>,
) -> ApiResult<Json<ClassOne>> {
    require_admin(&me)?;
    let level = queries::get_level(&state.db, request.level_id).await?;

    let class_id: i64 =
        sqlx::query_scalar("INSERT INTO classes (level_id, name) VALUES (?, ?) RETURNING id")
            .bind(level.id)
            .bind(&request.name)
            .fetch_one(&state.db)
            .await
            .map_err(Error::Database)?;

    let class = queries::get_class(&state.db, class_id).await?;
    Ok(Json(ClassOne { level, class }))
}

/// GET /classes/:class_id
///
/// Students of the class may view their own roster; anyone else needs admin.
pub async fn get(
    State(state): State<AppState>,
    me: Me,
    Path(class_id): Path<i64>,
) -> ApiResult<Json<ClassDetail>> {
    authorize(
        &me,
        me.student.as_ref().is_some_and(|s| s.class_id == class_id),
    )?;

    let class = queries::get_class(&state.db, class_id).await?;
    let level = queries::get_level(&state.db, class.level_id).await?;
    let belts = queries::list_belts(&state.db).await?;
    let skill_domains = queries::list_skill_domains(&state.db).await?;
    let students = queries::list_students_of_class(&state.db, class_id).await?;
    let evaluations = queries::list_successful_evaluations_of_class(&state.db, class_id).await?;

    let mut by_student: BTreeMap<i64, Vec<StudentBelt>> = BTreeMap::new();
    for evaluation in evaluations {
        by_student
            .entry(evaluation.student_id)
            .or_default()
            .push(StudentBelt {
                skill_domain_id: evaluation.skill_domain_id,
                belt_id: evaluation.belt_id,
            });
    }

    Ok(Json(ClassDetail {
        level,
        class,
        belts,
        skill_domains,
        students,
        student_belts: by_student
            .into_iter()
            .map(|(student_id, belts)| StudentBelts { student_id, belts })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateClassRequest {
    pub name: Option<String>,
}

/// PUT /classes/:class_id
pub async fn update(
    State(state): State<AppState>,
    me: Me,
    Path(class_id): Path<i64>,
    Json(request): Json<UpdateClassRequest>,
) -> ApiResult<Json<ClassOne>> {
    require_admin(&me)?;
    let class = queries::get_class(&state.db, class_id).await?;

    let name = request.name.unwrap_or(class.name);
    sqlx::query("UPDATE classes SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(class_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    let class = queries::get_class(&state.db, class_id).await?;
    let level = queries::get_level(&state.db, class.level_id).await?;
    Ok(Json(ClassOne { level, class }))
}

/// DELETE /classes/:class_id
pub async fn remove(
    State(state): State<AppState>,
    me: Me,
    Path(class_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&me)?;
    queries::get_class(&state.db, class_id).await?;

    sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(class_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /classes/:class_id/waitlist
///
/// Pending registrations of the class's students, grouped by student.
pub async fn waitlist(
    State(state): State<AppState>,
    me: Me,
    Path(class_id): Path<i64>,
) -> ApiResult<Json<WaitlistMappingList>> {
    require_admin(&me)?;
    queries::get_class(&state.db, class_id).await?;

    let entries = queries::list_waitlist_of_class(&state.db, class_id).await?;

    let mut by_student: BTreeMap<i64, Vec<WaitlistEntry>> = BTreeMap::new();
    for entry in entries {
        by_student.entry(entry.student_id).or_default().push(entry);
    }

    Ok(Json(WaitlistMappingList {
        waitlist_mappings: by_student
            .into_iter()
            .map(|(student_id, waitlist_entries)| WaitlistMapping {
                student_id,
                waitlist_entries,
            })
            .collect(),
    }))
}
