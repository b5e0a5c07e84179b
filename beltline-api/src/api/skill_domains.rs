//! Skill domain management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use beltline_common::db::models::SkillDomain;
use beltline_common::Error;
use serde::{Deserialize, Serialize};

use crate::api::auth::{require_admin, Me};
use crate::api::ApiResult;
use crate::{queries, AppState};

#[derive(Debug, Serialize)]
pub struct SkillDomainList {
    pub skill_domains: Vec<SkillDomain>,
}

#[derive(Debug, Serialize)]
pub struct SkillDomainOne {
    pub skill_domain: SkillDomain,
}

/// GET /skill-domains
pub async fn list(State(state): State<AppState>, _me: Me) -> ApiResult<Json<SkillDomainList>> {
    let skill_domains = queries::list_skill_domains(&state.db).await?;
    Ok(Json(SkillDomainList { skill_domains }))
}

#[derive(Debug, Deserialize)]
pub struct CreateSkillDomainRequest {
    pub name: String,
    pub code: String,
}

/// POST /skill-domains
pub async fn create(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<CreateSkillDomainRequest>,
) -> ApiResult<Json<SkillDomainOne>> {
    require_admin(&me)?;

    let skill_domain_id: i64 =
        sqlx::query_scalar("INSERT INTO skill_domains (name, code) VALUES (?, ?) RETURNING id")
            .bind(&request.name)
            .bind(&request.code)
            .fetch_one(&state.db)
            .await
            .map_err(Error::Database)?;

    let skill_domain = queries::get_skill_domain(&state.db, skill_domain_id).await?;
    Ok(Json(SkillDomainOne { skill_domain }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSkillDomainRequest {
    pub name: Option<String>,
    pub code: Option<String>,
}

/// PUT /skill-domains/:skill_domain_id
pub async fn update(
    State(state): State<AppState>,
    me: Me,
    Path(skill_domain_id): Path<i64>,
    Json(request): Json<UpdateSkillDomainRequest>,
) -> ApiResult<Json<SkillDomainOne>> {
    require_admin(&me)?;
    let skill_domain = queries::get_skill_domain(&state.db, skill_domain_id).await?;

    let name = request.name.unwrap_or(skill_domain.name);
    let code = request.code.unwrap_or(skill_domain.code);

    sqlx::query("UPDATE skill_domains SET name = ?, code = ? WHERE id = ?")
        .bind(&name)
        .bind(&code)
        .bind(skill_domain_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    let skill_domain = queries::get_skill_domain(&state.db, skill_domain_id).await?;
    Ok(Json(SkillDomainOne { skill_domain }))
}

/// DELETE /skill-domains/:skill_domain_id
pub async fn remove(
    State(state): State<AppState>,
    me: Me,
    Path(skill_domain_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&me)?;
    queries::get_skill_domain(&state.db, skill_domain_id).await?;

    sqlx::query("DELETE FROM skill_domains WHERE id = ?")
        .bind(skill_domain_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    Ok(StatusCode::NO_CONTENT)
}
