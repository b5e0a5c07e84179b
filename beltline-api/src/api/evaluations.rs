//! Direct evaluation record edits (admin)
//!
//! The normal path into this table is waitlist conversion; these handlers
//! cover manual corrections.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use beltline_common::db::models::Evaluation;
use beltline_common::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::auth::{require_admin, Me};
use crate::api::ApiResult;
use crate::{queries, AppState};

#[derive(Debug, Serialize)]
pub struct EvaluationOne {
    pub evaluation: Evaluation,
}

/// Dates come in as strings so a malformed one is a clean 400 instead of a
/// deserialization rejection.
fn parse_date(raw: &str) -> Result<NaiveDate> {
    raw.parse::<NaiveDate>()
        .map_err(|_| Error::BadRequest(format!("Invalid date {}", raw)))
}

#[derive(Debug, Deserialize)]
pub struct CreateEvaluationRequest {
    pub student_id: i64,
    pub skill_domain_id: i64,
    pub belt_id: i64,
    pub date: String,
    pub success: bool,
}

/// POST /evaluations
pub async fn create(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<CreateEvaluationRequest>,
) -> ApiResult<Json<EvaluationOne>> {
    require_admin(&me)?;

    let date = parse_date(&request.date)?;
    queries::get_student(&state.db, request.student_id).await?;
    queries::get_skill_domain(&state.db, request.skill_domain_id).await?;
    queries::get_belt(&state.db, request.belt_id).await?;

    let evaluation_id: i64 = sqlx::query_scalar(
        "INSERT INTO evaluations (student_id, skill_domain_id, belt_id, date, success) \
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(request.student_id)
    .bind(request.skill_domain_id)
    .bind(request.belt_id)
    .bind(date)
    .bind(request.success)
    .fetch_one(&state.db)
    .await
    .map_err(Error::Database)?;

    let evaluation = queries::get_evaluation(&state.db, evaluation_id).await?;
    Ok(Json(EvaluationOne { evaluation }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEvaluationRequest {
    pub skill_domain_id: Option<i64>,
    pub belt_id: Option<i64>,
    pub date: Option<String>,
    pub success: Option<bool>,
}

/// PUT /evaluations/:evaluation_id
pub async fn update(
    State(state): State<AppState>,
    me: Me,
    Path(evaluation_id): Path<i64>,
    Json(request): Json<UpdateEvaluationRequest>,
) -> ApiResult<Json<EvaluationOne>> {
    require_admin(&me)?;
    let evaluation = queries::get_evaluation(&state.db, evaluation_id).await?;

    let skill_domain_id = match request.skill_domain_id {
        Some(id) => {
            queries::get_skill_domain(&state.db, id).await?;
            id
        }
        None => evaluation.skill_domain_id,
    };
    let belt_id = match request.belt_id {
        Some(id) => {
            queries::get_belt(&state.db, id).await?;
            id
        }
        None => evaluation.belt_id,
    };
    let date = match request.date {
        Some(raw) => parse_date(&raw)?,
        None => evaluation.date,
    };
    let success = request.success.unwrap_or(evaluation.success);

    sqlx::query(
        "UPDATE evaluations SET skill_domain_id = ?, belt_id = ?, date = ?, success = ? \
         WHERE id = ?",
    )
    .bind(skill_domain_id)
    .bind(belt_id)
    .bind(date)
    .bind(success)
    .bind(evaluation_id)
    .execute(&state.db)
    .await
    .map_err(Error::Database)?;

    let evaluation = queries::get_evaluation(&state.db, evaluation_id).await?;
    Ok(Json(EvaluationOne { evaluation }))
}

/// DELETE /evaluations/:evaluation_id
pub async fn remove(
    State(state): State<AppState>,
    me: Me,
    Path(evaluation_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&me)?;
    queries::get_evaluation(&state.db, evaluation_id).await?;

    sqlx::query("DELETE FROM evaluations WHERE id = ?")
        .bind(evaluation_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    Ok(StatusCode::NO_CONTENT)
}
