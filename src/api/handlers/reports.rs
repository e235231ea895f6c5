use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::SqlitePool;

use crate::{
    api::errors::AppError,
    auth::AuthUser,
    reports::{DashboardSnapshot, ReportService},
};

/// `text/csv` attachment response.
pub(super) fn csv_download(file_name: &str, csv: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        csv,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    responses((status = 200, description = "Counts and per-building load", body = DashboardSnapshot)),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn dashboard(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
) -> Result<Json<DashboardSnapshot>, AppError> {
    Ok(Json(ReportService::new(pool).dashboard().await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/export/alerts",
    responses((status = 200, description = "alerts.csv", content_type = "text/csv", body = String)),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn export_alerts(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
) -> Result<Response, AppError> {
    let csv = ReportService::new(pool).export_alerts_csv().await?;
    Ok(csv_download("alerts.csv", csv))
}

#[utoipa::path(
    get,
    path = "/api/reports/export/incidents",
    responses((status = 200, description = "incidents.csv", content_type = "text/csv", body = String)),
    security(("bearer" = [])),
    tag = "reports"
)]
pub async fn export_incidents(
    State(pool): State<SqlitePool>,
    _user: AuthUser,
) -> Result<Response, AppError> {
    let csv = ReportService::new(pool).export_incidents_csv().await?;
    Ok(csv_download("incidents.csv", csv))
}
