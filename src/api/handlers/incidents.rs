use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::SqlitePool;

use crate::{
    api::errors::AppError,
    auth::AuthUser,
    db::models::Incident,
    incidents::{IncidentInput, IncidentService},
};

#[utoipa::path(
    get,
    path = "/api/incidents",
    responses((status = 200, description = "All incidents, most recent first", body = Vec<Incident>)),
    security(("bearer" = [])),
    tag = "incidents"
)]
pub async fn list_incidents(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
) -> Result<Json<Vec<Incident>>, AppError> {
    Ok(Json(IncidentService::new(pool).list().await?))
}

#[utoipa::path(
    get,
    path = "/api/incidents/{id}",
    params(("id" = i64, Path, description = "Incident id")),
    responses(
        (status = 200, description = "Incident", body = Incident),
        (status = 404, description = "Incident not found"),
    ),
    security(("bearer" = [])),
    tag = "incidents"
)]
pub async fn get_incident(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<Json<Incident>, AppError> {
    IncidentService::new(pool)
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Incident {id} not found.")))
}

#[utoipa::path(
    post,
    path = "/api/incidents",
    request_body = IncidentInput,
    responses(
        (status = 201, description = "Incident recorded", body = Incident),
        (status = 400, description = "Unknown building"),
    ),
    security(("bearer" = [])),
    tag = "incidents"
)]
pub async fn create_incident(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
    Json(input): Json<IncidentInput>,
) -> Result<(StatusCode, Json<Incident>), AppError> {
    let incident = IncidentService::new(pool).create(input).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

#[utoipa::path(
    put,
    path = "/api/incidents/{id}",
    params(("id" = i64, Path, description = "Incident id")),
    request_body = IncidentInput,
    responses(
        (status = 204, description = "Incident updated"),
        (status = 400, description = "Unknown building"),
        (status = 404, description = "Incident not found"),
    ),
    security(("bearer" = [])),
    tag = "incidents"
)]
pub async fn update_incident(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
    Json(input): Json<IncidentInput>,
) -> Result<StatusCode, AppError> {
    if IncidentService::new(pool).update(id, input).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Incident {id} not found.")))
    }
}

#[utoipa::path(
    delete,
    path = "/api/incidents/{id}",
    params(("id" = i64, Path, description = "Incident id")),
    responses(
        (status = 204, description = "Incident deleted"),
        (status = 404, description = "Incident not found"),
    ),
    security(("bearer" = [])),
    tag = "incidents"
)]
pub async fn delete_incident(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    _user: AuthUser,
) -> Result<StatusCode, AppError> {
    if IncidentService::new(pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Incident {id} not found.")))
    }
}
