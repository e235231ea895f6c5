use std::{collections::HashSet, fmt::Write as _};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{error::ServiceResult, reports::csv_timestamp};

pub const READINGS_CSV_HEADER: &str = "Id,SensorId,SensorName,Building,Value,Timestamp";

/// One row of a reading import. Missing values default to `0`, missing
/// timestamps to the import time.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReadingImport {
    pub sensor_id: i64,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ImportSummary {
    pub imported: u32,
    pub skipped: u32,
    pub notes: Vec<String>,
}

#[derive(FromRow)]
struct ReadingRow {
    id: i64,
    sensor_id: i64,
    sensor_name: String,
    building_name: Option<String>,
    value: f64,
    timestamp: DateTime<Utc>,
}

/// Download name for a readings export.
pub fn readings_file_name(sensor_id: Option<i64>) -> String {
    match sensor_id {
        Some(id) => format!("sensor-{id}-readings.csv"),
        None => "sensor-readings.csv".to_owned(),
    }
}

#[derive(Clone)]
pub struct PortabilityService {
    pool: SqlitePool,
}

impl PortabilityService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Readings of every sensor, or of one sensor when `sensor_id` is set.
    pub async fn export_sensor_readings_csv(&self, sensor_id: Option<i64>) -> ServiceResult<String> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            "SELECT r.id, r.sensor_id, s.name AS sensor_name, b.name AS building_name, \
                    r.value, r.timestamp \
             FROM sensor_readings r \
             INNER JOIN sensors s ON s.id = r.sensor_id \
             LEFT JOIN buildings b ON b.id = s.building_id \
             WHERE (?1 IS NULL OR r.sensor_id = ?1) \
             ORDER BY r.timestamp DESC, r.id DESC",
        )
        .bind(sensor_id)
        .fetch_all(&self.pool)
        .await?;

        let mut csv = String::new();
        csv.push_str(READINGS_CSV_HEADER);
        csv.push('\n');
        for row in rows {
            let _ = writeln!(
                csv,
                "{},{},\"{}\",\"{}\",{},{}",
                row.id,
                row.sensor_id,
                row.sensor_name,
                row.building_name.unwrap_or_default(),
                row.value,
                csv_timestamp(&row.timestamp),
            );
        }
        Ok(csv)
    }

    /// Inserts every row whose sensor exists; rows for unknown sensors are
    /// skipped with a note. All inserts share one transaction.
    pub async fn import_sensor_readings(
        &self,
        readings: Vec<ReadingImport>,
    ) -> ServiceResult<ImportSummary> {
        let mut summary = ImportSummary::default();
        if readings.is_empty() {
            summary.notes.push("No readings supplied.".to_owned());
            return Ok(summary);
        }

        let mut tx = self.pool.begin().await?;

        let requested: HashSet<i64> = readings.iter().map(|r| r.sensor_id).collect();
        let mut lookup = QueryBuilder::<Sqlite>::new("SELECT id FROM sensors WHERE id IN (");
        let mut ids = lookup.separated(", ");
        for id in &requested {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        let existing: HashSet<i64> = lookup
            .build_query_scalar::<i64>()
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();

        let now = Utc::now();
        for reading in readings {
            if !existing.contains(&reading.sensor_id) {
                summary.skipped += 1;
                summary.notes.push(format!(
                    "Sensor {} does not exist. Reading skipped.",
                    reading.sensor_id
                ));
                continue;
            }

            sqlx::query("INSERT INTO sensor_readings (value, timestamp, sensor_id) VALUES (?, ?, ?)")
                .bind(reading.value.unwrap_or(0.0))
                .bind(reading.timestamp.unwrap_or(now))
                .bind(reading.sensor_id)
                .execute(&mut *tx)
                .await?;
            summary.imported += 1;
        }

        tx.commit().await?;

        if summary.skipped > 0 {
            warn!(skipped = summary.skipped, "Import skipped readings for unknown sensors");
        }
        info!(imported = summary.imported, skipped = summary.skipped, "Sensor readings imported");
        Ok(summary)
    }
}
