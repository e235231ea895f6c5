use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use utoipa::ToSchema;

use crate::{db::models::RESOLVED_STATUS, error::ServiceResult};

pub const ALERTS_CSV_HEADER: &str =
    "Id,Timestamp,Severity,IsResolved,SensorId,SensorName,Building,Message";
pub const INCIDENTS_CSV_HEADER: &str =
    "Id,Type,Severity,Status,Building,StartedAt,EndedAt,Description";

/// Per-building load line of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct BuildingLoad {
    pub building_id: i64,
    pub building_name: String,
    pub sensor_count: i64,
    pub open_incidents: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSnapshot {
    pub total_buildings: i64,
    pub total_sensors: i64,
    pub active_sensors: i64,
    pub inactive_sensors: i64,
    pub open_incidents: i64,
    pub resolved_incidents: i64,
    pub open_alerts: i64,
    pub resolved_alerts: i64,
    pub generated_at_utc: DateTime<Utc>,
    /// Busiest buildings first: open incidents, then sensor count.
    pub buildings: Vec<BuildingLoad>,
}

#[derive(FromRow)]
struct AlertRow {
    id: i64,
    timestamp: DateTime<Utc>,
    severity: String,
    is_resolved: bool,
    sensor_id: i64,
    sensor_name: Option<String>,
    building_name: Option<String>,
    message: String,
}

#[derive(FromRow)]
struct IncidentRow {
    id: i64,
    incident_type: String,
    severity: String,
    status: String,
    building_name: Option<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    description: String,
}

/// Round-trip ISO-8601 used in every CSV file.
pub(crate) fn csv_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Free-text columns swap `"` for `''` instead of CSV-style doubling.
pub(crate) fn sanitize(text: &str) -> String {
    text.replace('"', "''")
}

#[derive(Clone)]
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self) -> ServiceResult<DashboardSnapshot> {
        let mut tx = self.pool.begin().await?;

        let total_buildings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buildings")
            .fetch_one(&mut *tx)
            .await?;
        let total_sensors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sensors")
            .fetch_one(&mut *tx)
            .await?;
        let active_sensors: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sensors WHERE is_active = 1")
                .fetch_one(&mut *tx)
                .await?;
        let open_incidents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM incidents WHERE status <> ?")
                .bind(RESOLVED_STATUS)
                .fetch_one(&mut *tx)
                .await?;
        let resolved_incidents: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM incidents WHERE status = ?")
                .bind(RESOLVED_STATUS)
                .fetch_one(&mut *tx)
                .await?;
        let open_alerts: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE is_resolved = 0")
                .fetch_one(&mut *tx)
                .await?;
        let resolved_alerts: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE is_resolved = 1")
                .fetch_one(&mut *tx)
                .await?;

        let buildings = sqlx::query_as::<_, BuildingLoad>(
            "SELECT b.id AS building_id, b.name AS building_name, \
                    (SELECT COUNT(*) FROM sensors s WHERE s.building_id = b.id) AS sensor_count, \
                    (SELECT COUNT(*) FROM incidents i \
                      WHERE i.building_id = b.id AND i.status <> ?) AS open_incidents \
             FROM buildings b \
             ORDER BY open_incidents DESC, sensor_count DESC, b.id",
        )
        .bind(RESOLVED_STATUS)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(total_buildings, total_sensors, open_incidents, "Dashboard snapshot computed");
        Ok(DashboardSnapshot {
            total_buildings,
            total_sensors,
            active_sensors,
            inactive_sensors: total_sensors - active_sensors,
            open_incidents,
            resolved_incidents,
            open_alerts,
            resolved_alerts,
            generated_at_utc: Utc::now(),
            buildings,
        })
    }

    pub async fn export_alerts_csv(&self) -> ServiceResult<String> {
        let rows = sqlx::query_as::<_, AlertRow>(
            "SELECT a.id, a.timestamp, a.severity, a.is_resolved, a.sensor_id, \
                    s.name AS sensor_name, b.name AS building_name, a.message \
             FROM alerts a \
             LEFT JOIN sensors s ON s.id = a.sensor_id \
             LEFT JOIN buildings b ON b.id = s.building_id \
             ORDER BY a.timestamp DESC, a.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut csv = String::new();
        csv.push_str(ALERTS_CSV_HEADER);
        csv.push('\n');
        for row in rows {
            let _ = writeln!(
                csv,
                "{},{},{},{},{},\"{}\",\"{}\",\"{}\"",
                row.id,
                csv_timestamp(&row.timestamp),
                row.severity,
                row.is_resolved,
                row.sensor_id,
                row.sensor_name.unwrap_or_default(),
                row.building_name.unwrap_or_default(),
                sanitize(&row.message),
            );
        }
        Ok(csv)
    }

    pub async fn export_incidents_csv(&self) -> ServiceResult<String> {
        let rows = sqlx::query_as::<_, IncidentRow>(
            "SELECT i.id, i.type AS incident_type, i.severity, i.status, \
                    b.name AS building_name, i.started_at, i.ended_at, i.description \
             FROM incidents i \
             LEFT JOIN buildings b ON b.id = i.building_id \
             ORDER BY i.started_at DESC, i.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut csv = String::new();
        csv.push_str(INCIDENTS_CSV_HEADER);
        csv.push('\n');
        for row in rows {
            let _ = writeln!(
                csv,
                "{},{},{},{},\"{}\",{},{},\"{}\"",
                row.id,
                row.incident_type,
                row.severity,
                row.status,
                row.building_name.unwrap_or_default(),
                csv_timestamp(&row.started_at),
                row.ended_at.as_ref().map(csv_timestamp).unwrap_or_default(),
                sanitize(&row.description),
            );
        }
        Ok(csv)
    }
}
