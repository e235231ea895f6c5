use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::SqlitePool;

use crate::{
    api::errors::AppError,
    auth::AuthUser,
    db::models::Sensor,
    sensors::{NewSensor, SensorService, SensorUpdate},
};

#[utoipa::path(
    get,
    path = "/api/sensors",
    responses((status = 200, description = "All sensors", body = Vec<Sensor>)),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn list_sensors(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
) -> Result<Json<Vec<Sensor>>, AppError> {
    Ok(Json(SensorService::new(pool).list().await?))
}

#[utoipa::path(
    get,
    path = "/api/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Sensor", body = Sensor),
        (status = 404, description = "Sensor not found"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn get_sensor(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<Json<Sensor>, AppError> {
    SensorService::new(pool)
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Sensor {id} not found.")))
}

#[utoipa::path(
    post,
    path = "/api/sensors",
    request_body = NewSensor,
    responses(
        (status = 201, description = "Sensor created (active)", body = Sensor),
        (status = 400, description = "Invalid sensor or unknown building"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn create_sensor(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
    Json(input): Json<NewSensor>,
) -> Result<(StatusCode, Json<Sensor>), AppError> {
    let sensor = SensorService::new(pool).create(input).await?;
    Ok((StatusCode::CREATED, Json(sensor)))
}

#[utoipa::path(
    put,
    path = "/api/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    request_body = SensorUpdate,
    responses(
        (status = 204, description = "Sensor updated"),
        (status = 400, description = "Invalid sensor or unknown building"),
        (status = 404, description = "Sensor not found"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn update_sensor(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
    Json(input): Json<SensorUpdate>,
) -> Result<StatusCode, AppError> {
    if SensorService::new(pool).update(id, input).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Sensor {id} not found.")))
    }
}

/// Deletes the sensor together with its readings and alerts.
#[utoipa::path(
    delete,
    path = "/api/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 204, description = "Sensor deleted"),
        (status = 404, description = "Sensor not found"),
    ),
    security(("bearer" = [])),
    tag = "sensors"
)]
pub async fn delete_sensor(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<StatusCode, AppError> {
    if SensorService::new(pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Sensor {id} not found.")))
    }
}
