//! User account management (admin)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use beltline_common::auth::hash_password;
use beltline_common::db::models::User;
use beltline_common::Error;
use serde::{Deserialize, Serialize};

use crate::api::auth::{authorize, require_admin, Me};
use crate::api::ApiResult;
use crate::{queries, AppState};

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserOne {
    pub user: User,
}

/// GET /users
pub async fn list(State(state): State<AppState>, me: Me) -> ApiResult<Json<UserList>> {
    require_admin(&me)?;
    let users = queries::list_users(&state.db).await?;
    Ok(Json(UserList { users }))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

/// POST /users
pub async fn create(
    State(state): State<AppState>,
    me: Me,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<Json<UserOne>> {
    require_admin(&me)?;

    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, password_hash, is_admin) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&request.username)
    .bind(hash_password(&request.password))
    .bind(request.is_admin)
    .fetch_one(&state.db)
    .await;

    let user_id = inserted.map_err(|e| duplicate_username(e, &request.username))?;
    let user = queries::get_user(&state.db, user_id).await?;
    Ok(Json(UserOne { user }))
}

/// GET /users/:user_id
pub async fn get(
    State(state): State<AppState>,
    me: Me,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserOne>> {
    authorize(&me, me.user.id == user_id)?;
    let user = queries::get_user(&state.db, user_id).await?;
    Ok(Json(UserOne { user }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

/// PUT /users/:user_id
pub async fn update(
    State(state): State<AppState>,
    me: Me,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserOne>> {
    require_admin(&me)?;
    let user = queries::get_user(&state.db, user_id).await?;

    let username = request.username.unwrap_or(user.username);
    let password_hash = match request.password {
        Some(password) if !password.is_empty() => hash_password(&password),
        _ => user.password_hash,
    };
    let is_admin = request.is_admin.unwrap_or(user.is_admin);

    sqlx::query("UPDATE users SET username = ?, password_hash = ?, is_admin = ? WHERE id = ?")
        .bind(&username)
        .bind(&password_hash)
        .bind(is_admin)
        .bind(user_id)
        .execute(&state.db)
        .await
        .map_err(|e| duplicate_username(e, &username))?;

    let user = queries::get_user(&state.db, user_id).await?;
    Ok(Json(UserOne { user }))
}

/// DELETE /users/:user_id
pub async fn remove(
    State(state): State<AppState>,
    me: Me,
    Path(user_id): Path<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&me)?;
    queries::get_user(&state.db, user_id).await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&state.db)
        .await
        .map_err(Error::Database)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Map a unique-constraint violation on `users.username` to a 409
fn duplicate_username(e: sqlx::Error, username: &str) -> crate::api::ApiError {
    let wrapped = Error::Database(e);
    if wrapped.is_unique_violation() {
        Error::Conflict(format!("User with username \"{}\" already exists", username)).into()
    } else {
        wrapped.into()
    }
}
