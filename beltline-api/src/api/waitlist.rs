//! Waitlist entry removal and batch conversion

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use beltline_common::Error;
use serde::Deserialize;

use crate::api::auth::{authorize, require_admin, Me};
use crate::api::ApiResult;
use crate::progression::{self, CompletedEvaluation, ConversionReport};
use crate::{queries, AppState};

/// DELETE /waitlist/:waitlist_id
///
/// Students may withdraw their own registration while their registration
/// flag is set; admins may remove any.
pub async fn remove(
    State(state): State<AppState>,
    me: Me,
    Path(waitlist_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let entry = queries::get_waitlist_entry(&state.db, waitlist_id).await?;
    authorize(
        &me,
        me.student
            .as_ref()
            .is_some_and(|s| s.id == entry.student_id && s.can_register_to_waitlist),
    )?;

    sqlx::query("DELETE FROM waitlist_entries WHERE id = ?")
        .bind(waitlist_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CompletedEvaluationRequest {
    pub waitlist_entry_id: i64,
    pub date: String,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub completed_evaluations: Vec<CompletedEvaluationRequest>,
}

/// POST /waitlist/convert
///
/// All dates are validated up front so a typo never half-applies a batch.
pub async fn convert(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<ConvertRequest>,
) -> ApiResult<Json<ConversionReport>> {
    require_admin(&me)?;

    let mut completed = Vec::with_capacity(request.completed_evaluations.len());
    for item in &request.completed_evaluations {
        let date = item
            .date
            .parse()
            .map_err(|_| Error::BadRequest(format!("Invalid date {}", item.date)))?;
        completed.push(CompletedEvaluation {
            waitlist_entry_id: item.waitlist_entry_id,
            date,
            success: item.success,
        });
    }

    let report = progression::convert_waitlist(&state.db, &completed).await?;
    Ok(Json(report))
}
