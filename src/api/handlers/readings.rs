use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::SqlitePool;

use crate::{
    api::errors::AppError,
    auth::AuthUser,
    db::models::SensorReading,
    readings::{ReadingInput, ReadingService},
};

#[utoipa::path(
    get,
    path = "/api/sensorreadings",
    responses((status = 200, description = "All readings, newest first", body = Vec<SensorReading>)),
    security(("bearer" = [])),
    tag = "readings"
)]
pub async fn list_readings(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
) -> Result<Json<Vec<SensorReading>>, AppError> {
    Ok(Json(ReadingService::new(pool).list().await?))
}

#[utoipa::path(
    get,
    path = "/api/sensorreadings/{id}",
    params(("id" = i64, Path, description = "Reading id")),
    responses(
        (status = 200, description = "Reading", body = SensorReading),
        (status = 404, description = "Reading not found"),
    ),
    security(("bearer" = [])),
    tag = "readings"
)]
pub async fn get_reading(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<Json<SensorReading>, AppError> {
    ReadingService::new(pool)
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Reading {id} not found.")))
}

#[utoipa::path(
    post,
    path = "/api/sensorreadings",
    request_body = ReadingInput,
    responses(
        (status = 201, description = "Reading stored", body = SensorReading),
        (status = 400, description = "Unknown sensor"),
    ),
    security(("bearer" = [])),
    tag = "readings"
)]
pub async fn create_reading(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
    Json(input): Json<ReadingInput>,
) -> Result<(StatusCode, Json<SensorReading>), AppError> {
    let reading = ReadingService::new(pool).create(input).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

#[utoipa::path(
    put,
    path = "/api/sensorreadings/{id}",
    params(("id" = i64, Path, description = "Reading id")),
    request_body = ReadingInput,
    responses(
        (status = 204, description = "Reading updated"),
        (status = 400, description = "Unknown sensor"),
        (status = 404, description = "Reading not found"),
    ),
    security(("bearer" = [])),
    tag = "readings"
)]
pub async fn update_reading(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
    Json(input): Json<ReadingInput>,
) -> Result<StatusCode, AppError> {
    if ReadingService::new(pool).update(id, input).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Reading {id} not found.")))
    }
}

#[utoipa::path(
    delete,
    path = "/api/sensorreadings/{id}",
    params(("id" = i64, Path, description = "Reading id")),
    responses(
        (status = 204, description = "Reading deleted"),
        (status = 404, description = "Reading not found"),
    ),
    security(("bearer" = [])),
    tag = "readings"
)]
pub async fn delete_reading(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<StatusCode, AppError> {
    if ReadingService::new(pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Reading {id} not found.")))
    }
}
