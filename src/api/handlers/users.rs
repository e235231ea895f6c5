use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::SqlitePool;

use crate::{
    api::{
        dto::{UserDto, UserUpdateRequest},
        errors::AppError,
    },
    auth::AdminUser,
    db::models::UserRole,
    users::{check_password, NewUser, UserService},
};

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All accounts", body = Vec<UserDto>),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserDto>>, AppError> {
    let users = UserService::new(pool).list().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Account", body = UserDto),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _admin: AdminUser,
) -> Result<Json<UserDto>, AppError> {
    UserService::new(pool)
        .get(id)
        .await?
        .map(|u| Json(u.into()))
        .ok_or_else(|| AppError::not_found(format!("User {id} not found.")))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created", body = UserDto),
        (status = 400, description = "Invalid role or duplicate username"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<UserDto>), AppError> {
    let user = UserService::new(pool).create(input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Changes the role and, when `new_password` is given, resets the password.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 204, description = "Account updated"),
        (status = 400, description = "Invalid role or weak password"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _admin: AdminUser,
    Json(input): Json<UserUpdateRequest>,
) -> Result<StatusCode, AppError> {
    let role: UserRole = input.role.parse()?;
    let new_password = input.new_password.as_deref().filter(|p| !p.is_empty());
    if let Some(password) = new_password {
        check_password(password)?;
    }
    let users = UserService::new(pool);

    if !users.update_role(id, role).await? {
        return Err(AppError::not_found(format!("User {id} not found.")));
    }
    if let Some(password) = new_password {
        users.reset_password(id, password).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _admin: AdminUser,
) -> Result<StatusCode, AppError> {
    if UserService::new(pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("User {id} not found.")))
    }
}
