use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use doctrack_common::{Role, Username, hash_password};

use crate::domain::AppState;
use crate::domain::document::lifecycle::UserId;
use crate::domain::repository::UserRepository;
use crate::domain::user::{HandlerChoice, NewUser, UserUpdate};
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::auth::{AdminUser, CurrentUser};
use crate::infrastructure::http::handlers::users::dto::{
    CreateUserRequest, UpdateProfileRequest, UpdateUserRequest, UserResponse,
};

pub mod dto;

pub async fn list_handlers<S: AppState>(
    State(state): State<S>,
    _user: CurrentUser,
) -> Result<ApiSuccess<Vec<HandlerChoice>>, ApiError> {
    let handlers = state.users().list_handlers().await?;
    Ok(ApiSuccess::new(StatusCode::OK, handlers))
}

pub async fn current_profile(CurrentUser(user): CurrentUser) -> ApiSuccess<UserResponse> {
    ApiSuccess::new(StatusCode::OK, user.into())
}

pub async fn update_profile<S: AppState>(
    State(state): State<S>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    let password_hash = new_password_hash(
        request.password,
        request.confirm_password,
        state.password_rounds(),
    )
    .await?;

    let update = UserUpdate {
        full_name: non_empty(request.full_name),
        position: non_empty(request.position),
        role: None,
        password_hash,
    };
    let user = state.users().update_user(user.id, update).await?;
    Ok(ApiSuccess::new(StatusCode::OK, user.into()))
}

pub async fn list_users<S: AppState>(
    State(state): State<S>,
    _admin: AdminUser,
) -> Result<ApiSuccess<Vec<UserResponse>>, ApiError> {
    let users = state.users().list_users().await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

pub async fn create_user<S: AppState>(
    State(state): State<S>,
    _admin: AdminUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    let username = Username::try_new(request.username)
        .map_err(|e| ApiError::UnprocessableEntity(format!("invalid username: {e}")))?;
    let full_name = non_empty(Some(request.full_name))
        .ok_or_else(|| ApiError::UnprocessableEntity("full_name is required".to_string()))?;
    let password_hash = new_password_hash(
        Some(request.password),
        Some(request.confirm_password),
        state.password_rounds(),
    )
    .await?
    .ok_or_else(|| ApiError::UnprocessableEntity("password is required".to_string()))?;

    let user = state
        .users()
        .create_user(NewUser {
            username,
            password_hash,
            full_name,
            position: non_empty(request.position),
            role: request.role.as_deref().map(Role::from).unwrap_or(Role::Staff),
        })
        .await?;
    Ok(ApiSuccess::new(StatusCode::CREATED, user.into()))
}

pub async fn update_user<S: AppState>(
    State(state): State<S>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<ApiSuccess<UserResponse>, ApiError> {
    let password_hash = new_password_hash(
        request.password,
        request.confirm_password,
        state.password_rounds(),
    )
    .await?;

    let update = UserUpdate {
        full_name: non_empty(request.full_name),
        position: non_empty(request.position),
        role: request.role.as_deref().map(Role::from),
        password_hash,
    };
    let user = state.users().update_user(UserId(id), update).await?;
    Ok(ApiSuccess::new(StatusCode::OK, user.into()))
}

pub async fn delete_user<S: AppState>(
    State(state): State<S>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if admin.id == UserId(id) {
        return Err(ApiError::ConflictWithServerState(
            "cannot delete your own account".to_string(),
        ));
    }
    state.users().delete_user(UserId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `None` when no new password was given. The confirmation must match.
async fn new_password_hash(
    password: Option<String>,
    confirm_password: Option<String>,
    rounds: u32,
) -> Result<Option<String>, ApiError> {
    let Some(password) = password.filter(|password| !password.is_empty()) else {
        return Ok(None);
    };
    if confirm_password.as_deref() != Some(password.as_str()) {
        return Err(ApiError::UnprocessableEntity(
            "password and confirmation do not match".to_string(),
        ));
    }

    let hash = tokio::task::spawn_blocking(move || hash_password(&password, rounds))
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))??;
    Ok(Some(hash))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
