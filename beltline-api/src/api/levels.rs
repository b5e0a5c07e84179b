//! Level management (admin)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use beltline_common::db::models::{Belt, ClassGroup, Level, SkillDomain};
use beltline_common::Error;
use serde::{Deserialize, Serialize};

use crate::api::auth::{require_admin, Me};
use crate::api::ApiResult;
use crate::{queries, AppState};

#[derive(Debug, Serialize)]
pub struct LevelList {
    pub levels: Vec<Level>,
}

#[derive(Debug, Serialize)]
pub struct LevelOne {
    pub level: Level,
}

/// Level detail: its classes plus the ladder and domains for display
#[derive(Debug, Serialize)]
pub struct LevelDetail {
    pub level: Level,
    pub classes: Vec<ClassGroup>,
    pub belts: Vec<Belt>,
    pub skill_domains: Vec<SkillDomain>,
}

/// GET /levels
pub async fn list(State(state): State<AppState>, me: Me) -> ApiResult<Json<LevelList>> {
    require_admin(&me)?;
    let levels = queries::list_levels(&state.db).await?;
    Ok(Json(LevelList { levels }))
}

#[derive(Debug, Deserialize)]
pub struct CreateLevelRequest {
    pub name: String,
}

/// POST /levels
pub async fn create(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<CreateLevelRequest>,
) -> ApiResult<Json<LevelOne>> {
    require_admin(&me)?;

    let level_id: i64 = sqlx::query_scalar("INSERT INTO levels (name) VALUES (?) RETURNING id")
        .bind(&request.name)
        .fetch_one(&state.db)
        .await
        .map_err(Error::Database)?;

    let level = queries::get_level(&state.db, level_id).await?;
    Ok(Json(LevelOne { level }))
}

/// GET /levels/:level_id
pub async fn get(
    State(state): State<AppState>,
    me: Me,
    Path(level_id): Path<i64>,
) -> ApiResult<Json<LevelDetail>> {
    require_admin(&me)?;
    let level = queries::get_level(&state.db, level_id).await?;
    let classes = queries::list_classes_of_level(&state.db, level_id).await?;
    let belts = queries::list_belts(&state.db).await?;
    let skill_domains = queries::list_skill_domains(&state.db).await?;
    Ok(Json(LevelDetail {
        level,
        classes,
        belts,
        skill_domains,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateLevelRequest {
    pub name: Option<String>,
}

/// PUT /levels/:level_id
pub async fn update(
    State(state): State<AppState>,
    me: Me,
    Path(level_id): Path<i64>,
    Json(request): Json<UpdateLevelRequest>,
) -> ApiResult<Json<LevelOne>> {
    require_admin(&me)?;
    let level = queries::get_level(&state.db, level_id).await?;

    let name = request.name.unwrap_or(level.name);
    sqlx::query("UPDATE levels SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(level_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    let level = queries::get_level(&state.db, level_id).await?;
    Ok(Json(LevelOne { level }))
}

/// DELETE /levels/:level_id
pub async fn remove(
    State(state): State<AppState>,
    me: Me,
    Path(level_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&me)?;
    queries::get_level(&state.db, level_id).await?;

    sqlx::query("DELETE FROM levels WHERE id = ?")
        .bind(level_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    Ok(StatusCode::NO_CONTENT)
}
