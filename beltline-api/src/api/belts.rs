//! Belt management
//!
//! Rank mutations go through the ledger in `crate::ledger`; handlers here
//! only touch the name, code, and color columns directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use beltline_common::db::models::Belt;
use beltline_common::Error;
use serde::{Deserialize, Serialize};

use crate::api::auth::{require_admin, Me};
use crate::api::ApiResult;
use crate::{ledger, queries, AppState};

#[derive(Debug, Serialize)]
pub struct BeltList {
    pub belts: Vec<Belt>,
}

#[derive(Debug, Serialize)]
pub struct BeltOne {
    pub belt: Belt,
}

/// GET /belts
pub async fn list(State(state): State<AppState>, _me: Me) -> ApiResult<Json<BeltList>> {
    let belts = queries::list_belts(&state.db).await?;
    Ok(Json(BeltList { belts }))
}

#[derive(Debug, Deserialize)]
pub struct CreateBeltRequest {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// POST /belts
///
/// The new belt always enters at the top of the ladder.
pub async fn create(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<CreateBeltRequest>,
) -> ApiResult<Json<BeltOne>> {
    require_admin(&me)?;

    let color = request.color.unwrap_or_else(|| "#ffffff".to_string());
    let belt = ledger::append_belt(&state.db, &request.name, &request.code, &color).await?;
    Ok(Json(BeltOne { belt }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBeltRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub color: Option<String>,
}

/// PUT /belts/:belt_id
pub async fn update(
    State(state): State<AppState>,
    me: Me,
    Path(belt_id): Path<i64>,
    Json(request): Json<UpdateBeltRequest>,
) -> ApiResult<Json<BeltOne>> {
    require_admin(&me)?;
    let belt = queries::get_belt(&state.db, belt_id).await?;

    let name = request.name.unwrap_or(belt.name);
    let code = request.code.unwrap_or(belt.code);
    let color = request.color.unwrap_or(belt.color);

    sqlx::query("UPDATE belts SET name = ?, code = ?, color = ? WHERE id = ?")
        .bind(&name)
        .bind(&code)
        .bind(&color)
        .bind(belt_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    let belt = queries::get_belt(&state.db, belt_id).await?;
    Ok(Json(BeltOne { belt }))
}

/// DELETE /belts/:belt_id
pub async fn remove(
    State(state): State<AppState>,
    me: Me,
    Path(belt_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&me)?;
    ledger::delete_belt(&state.db, belt_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ChangeRankRequest {
    pub other_belt_id: Option<i64>,
    pub increase_by: Option<i64>,
}

/// PATCH /belts/:belt_id/rank
///
/// Exactly one of `other_belt_id` (swap) or `increase_by` (shift) must be
/// given.
pub async fn change_rank(
    State(state): State<AppState>,
    me: Me,
    Path(belt_id): Path<i64>,
    Json(request): Json<ChangeRankRequest>,
) -> ApiResult<Json<BeltOne>> {
    require_admin(&me)?;

    let belt = match (request.other_belt_id, request.increase_by) {
        (Some(other_belt_id), None) => {
            ledger::swap_belts(&state.db, belt_id, other_belt_id).await?
        }
        (None, Some(increase_by)) => ledger::shift_belt(&state.db, belt_id, increase_by).await?,
        (Some(_), Some(_)) => {
            return Err(Error::BadRequest(
                "Only provide one of other_belt_id, increase_by".to_string(),
            )
            .into());
        }
        (None, None) => {
            return Err(Error::BadRequest(
                "Do provide one of other_belt_id, increase_by".to_string(),
            )
            .into());
        }
    };

    Ok(Json(BeltOne { belt }))
}
