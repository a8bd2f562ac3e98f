//! User administration.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use doorlink_core::AccessCode;
use doorlink_storage::{NewUser, User, UserRepository, UserUpdate};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub access_code: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub access_code: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

fn access_code(code: &str) -> ApiResult<AccessCode> {
    AccessCode::new(code).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `POST /api/users`
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(request) = body?;
    let (Some(name), Some(code)) = (non_blank(request.name), non_blank(request.access_code))
    else {
        return Err(ApiError::bad_request("name and accessCode are required"));
    };

    let new_user =
        NewUser::new(name, access_code(&code)?).active(request.is_active.unwrap_or(true));
    let user = state.users.create(&new_user).await?;
    info!(user_id = user.id, name = %user.name, "user created");

    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/users`
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.find_all().await?))
}

/// `PUT /api/users/{id}`; absent fields are left unchanged.
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Path(id) = id?;
    let Json(request) = body?;

    let update = UserUpdate {
        name: request.name,
        access_code: request.access_code.as_deref().map(access_code).transpose()?,
        is_active: request.is_active,
    };

    let user = if update.is_empty() {
        state
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?
    } else {
        state.users.update(id, &update).await?
    };
    info!(user_id = id, "user updated");

    Ok(Json(user))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Message>> {
    let Path(id) = id?;
    state.users.delete(id).await?;
    info!(user_id = id, "user deleted");

    Ok(Json(Message {
        message: "User deleted".to_string(),
    }))
}
