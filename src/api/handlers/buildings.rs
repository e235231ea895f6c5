use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::SqlitePool;

use crate::{
    api::{dto::BuildingDetailsDto, errors::AppError},
    auth::AuthUser,
    buildings::{BuildingInput, BuildingService},
    db::models::Building,
    weather::WeatherClient,
};

#[utoipa::path(
    get,
    path = "/api/buildings",
    responses(
        (status = 200, description = "All buildings", body = Vec<Building>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "buildings"
)]
pub async fn list_buildings(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
) -> Result<Json<Vec<Building>>, AppError> {
    Ok(Json(BuildingService::new(pool).list().await?))
}

/// A building together with the current weather at its coordinates.
#[utoipa::path(
    get,
    path = "/api/buildings/{id}",
    params(("id" = i64, Path, description = "Building id")),
    responses(
        (status = 200, description = "Building and current weather", body = BuildingDetailsDto),
        (status = 404, description = "Building not found"),
    ),
    security(("bearer" = [])),
    tag = "buildings"
)]
pub async fn get_building(
    State(pool): State<SqlitePool>,
    State(weather): State<WeatherClient>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<Json<BuildingDetailsDto>, AppError> {
    let building = BuildingService::new(pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Building {id} not found.")))?;
    let current_weather = weather
        .current_weather(building.latitude, building.longitude)
        .await;
    Ok(Json(BuildingDetailsDto {
        building,
        current_weather,
    }))
}

#[utoipa::path(
    post,
    path = "/api/buildings",
    request_body = BuildingInput,
    responses(
        (status = 201, description = "Building created", body = Building),
        (status = 400, description = "Invalid building"),
    ),
    security(("bearer" = [])),
    tag = "buildings"
)]
pub async fn create_building(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
    Json(input): Json<BuildingInput>,
) -> Result<(StatusCode, Json<Building>), AppError> {
    let building = BuildingService::new(pool).create(input).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

#[utoipa::path(
    put,
    path = "/api/buildings/{id}",
    params(("id" = i64, Path, description = "Building id")),
    request_body = BuildingInput,
    responses(
        (status = 204, description = "Building updated"),
        (status = 400, description = "Body id does not match the path"),
        (status = 404, description = "Building not found"),
    ),
    security(("bearer" = [])),
    tag = "buildings"
)]
pub async fn update_building(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
    Json(input): Json<BuildingInput>,
) -> Result<StatusCode, AppError> {
    if BuildingService::new(pool).update(id, input).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Building {id} not found.")))
    }
}

/// Deletes the building with its sensors, readings, alerts and incidents.
#[utoipa::path(
    delete,
    path = "/api/buildings/{id}",
    params(("id" = i64, Path, description = "Building id")),
    responses(
        (status = 204, description = "Building and dependents deleted"),
        (status = 404, description = "Building not found"),
    ),
    security(("bearer" = [])),
    tag = "buildings"
)]
pub async fn delete_building(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<StatusCode, AppError> {
    if BuildingService::new(pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Building {id} not found.")))
    }
}
