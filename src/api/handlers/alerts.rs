use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::SqlitePool;

use crate::{
    alerts::{AlertInput, AlertService},
    api::errors::AppError,
    auth::AuthUser,
    db::models::Alert,
};

#[utoipa::path(
    get,
    path = "/api/alerts",
    responses((status = 200, description = "All alerts, newest first", body = Vec<Alert>)),
    security(("bearer" = [])),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
) -> Result<Json<Vec<Alert>>, AppError> {
    Ok(Json(AlertService::new(pool).list().await?))
}

#[utoipa::path(
    get,
    path = "/api/alerts/{id}",
    params(("id" = i64, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert", body = Alert),
        (status = 404, description = "Alert not found"),
    ),
    security(("bearer" = [])),
    tag = "alerts"
)]
pub async fn get_alert(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<Json<Alert>, AppError> {
    AlertService::new(pool)
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Alert {id} not found.")))
}

#[utoipa::path(
    post,
    path = "/api/alerts",
    request_body = AlertInput,
    responses(
        (status = 201, description = "Alert raised", body = Alert),
        (status = 400, description = "Unknown sensor"),
    ),
    security(("bearer" = [])),
    tag = "alerts"
)]
pub async fn create_alert(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
    Json(input): Json<AlertInput>,
) -> Result<(StatusCode, Json<Alert>), AppError> {
    let alert = AlertService::new(pool).create(input).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

#[utoipa::path(
    put,
    path = "/api/alerts/{id}",
    params(("id" = i64, Path, description = "Alert id")),
    request_body = AlertInput,
    responses(
        (status = 204, description = "Alert updated"),
        (status = 400, description = "Unknown sensor"),
        (status = 404, description = "Alert not found"),
    ),
    security(("bearer" = [])),
    tag = "alerts"
)]
pub async fn update_alert(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
    Json(input): Json<AlertInput>,
) -> Result<StatusCode, AppError> {
    if AlertService::new(pool).update(id, input).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Alert {id} not found.")))
    }
}

#[utoipa::path(
    delete,
    path = "/api/alerts/{id}",
    params(("id" = i64, Path, description = "Alert id")),
    responses(
        (status = 204, description = "Alert deleted"),
        (status = 404, description = "Alert not found"),
    ),
    security(("bearer" = [])),
    tag = "alerts"
)]
pub async fn delete_alert(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<StatusCode, AppError> {
    if AlertService::new(pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Alert {id} not found.")))
    }
}
