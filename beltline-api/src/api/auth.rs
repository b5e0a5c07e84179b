//! Login endpoint and bearer-token middleware
//!
//! The middleware resolves the `Authorization: Bearer <token>` header to a
//! [`CurrentUser`] request extension (the user row plus the student row when
//! the account belongs to a student). Handlers then call [`require_admin`] or
//! [`authorize`] for their own rules.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use beltline_common::auth::{decode_token, issue_token, verify_password, Claims};
use beltline_common::db::models::{Student, User};
use beltline_common::Error;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{ApiError, ApiResult};
use crate::{queries, AppState};

/// Authenticated caller, attached to every protected request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub student: Option<Student>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub payload: Claims,
    pub token: String,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<Student>,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = queries::get_user_by_username(&state.db, &request.username).await?;
    let Some(mut user) = user else {
        return Err(Error::Unauthorized("Invalid credentials".to_string()).into());
    };
    if !verify_password(&request.password, &user.password_hash) {
        return Err(Error::Unauthorized("Invalid credentials".to_string()).into());
    }

    let now = Utc::now();
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(now)
        .bind(user.id)
        .execute(&state.db)
        .await?;
    user.last_login = Some(now);

    let student = queries::get_student_of_user(&state.db, user.id).await?;
    let (payload, token) = issue_token(
        &state.config.token_secret,
        user.id,
        state.config.token_ttl_secs,
    )?;

    info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        payload,
        token,
        user,
        student,
    }))
}

/// Authentication middleware for all protected routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("Missing Authorization header".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| Error::Unauthorized("Authorization header malformed".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::Unauthorized("Authorization header malformed".to_string()))?;

    let claims = decode_token(&state.config.token_secret, token)?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(claims.user_id)
        .fetch_optional(&state.db)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::Unauthorized(format!("User {} not found", claims.user_id)))?;

    let student = queries::get_student_of_user(&state.db, user.id).await?;

    request.extensions_mut().insert(CurrentUser { user, student });
    Ok(next.run(request).await)
}

/// Reject callers that are not administrators
pub fn require_admin(me: &CurrentUser) -> Result<(), ApiError> {
    if !me.user.is_admin {
        return Err(Error::Forbidden(
            "This action can only be performed by an administrator".to_string(),
        )
        .into());
    }
    Ok(())
}

/// Admins may do anything; everyone else needs `authorized` to hold
pub fn authorize(me: &CurrentUser, authorized: bool) -> Result<(), ApiError> {
    if !me.user.is_admin && !authorized {
        return Err(Error::Forbidden(
            "This action can not be performed by this user".to_string(),
        )
        .into());
    }
    Ok(())
}

/// Convenience extractor alias used by handlers
pub type Me = Extension<CurrentUser>;
