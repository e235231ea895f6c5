use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use sqlx::SqlitePool;

use super::reports::csv_download;
use crate::{
    api::{dto::ExportQuery, errors::AppError},
    auth::AuthUser,
    portability::{readings_file_name, ImportSummary, PortabilityService, ReadingImport},
};

#[utoipa::path(
    get,
    path = "/api/data-portability/sensor-readings/export",
    params(ExportQuery),
    responses((status = 200, description = "Sensor readings as CSV", content_type = "text/csv", body = String)),
    security(("bearer" = [])),
    tag = "data-portability"
)]
pub async fn export_readings(
    State(pool): State<SqlitePool>,
    Query(query): Query<ExportQuery>,
    _user: AuthUser,
) -> Result<Response, AppError> {
    let csv = PortabilityService::new(pool)
        .export_sensor_readings_csv(query.sensor_id)
        .await?;
    Ok(csv_download(&readings_file_name(query.sensor_id), csv))
}

/// Rows naming unknown sensors are skipped and reported in `notes`.
#[utoipa::path(
    post,
    path = "/api/data-portability/sensor-readings/import",
    request_body = Vec<ReadingImport>,
    responses((status = 200, description = "Import summary", body = ImportSummary)),
    security(("bearer" = [])),
    tag = "data-portability"
)]
pub async fn import_readings(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
    Json(rows): Json<Vec<ReadingImport>>,
) -> Result<Json<ImportSummary>, AppError> {
    Ok(Json(
        PortabilityService::new(pool)
            .import_sensor_readings(rows)
            .await?,
    ))
}
