use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::{
    db::models::SensorReading,
    error::{is_foreign_key_violation, ServiceError, ServiceResult},
};

const READING_COLUMNS: &str = "id, value, timestamp, sensor_id";

/// Request body for creating or replacing a sensor reading.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReadingInput {
    pub value: f64,
    /// Defaults to the current UTC time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub sensor_id: i64,
}

pub(crate) fn missing_sensor(sensor_id: i64) -> ServiceError {
    ServiceError::InvalidInput(format!("Sensor {sensor_id} does not exist."))
}

#[derive(Clone)]
pub struct ReadingService {
    pool: SqlitePool,
}

impl ReadingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ServiceResult<Vec<SensorReading>> {
        let rows = sqlx::query_as::<_, SensorReading>(&format!(
            "SELECT {READING_COLUMNS} FROM sensor_readings ORDER BY timestamp DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Option<SensorReading>> {
        let row = sqlx::query_as::<_, SensorReading>(&format!(
            "SELECT {READING_COLUMNS} FROM sensor_readings WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, input: ReadingInput) -> ServiceResult<SensorReading> {
        let reading = sqlx::query_as::<_, SensorReading>(&format!(
            "INSERT INTO sensor_readings (value, timestamp, sensor_id) \
             VALUES (?, ?, ?) RETURNING {READING_COLUMNS}"
        ))
        .bind(input.value)
        .bind(input.timestamp.unwrap_or_else(Utc::now))
        .bind(input.sensor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_sensor(input.sensor_id)
            } else {
                e.into()
            }
        })?;
        Ok(reading)
    }

    pub async fn update(&self, id: i64, input: ReadingInput) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE sensor_readings SET value = ?, timestamp = ?, sensor_id = ? WHERE id = ?",
        )
        .bind(input.value)
        .bind(input.timestamp.unwrap_or_else(Utc::now))
        .bind(input.sensor_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_sensor(input.sensor_id)
            } else {
                e.into()
            }
        })?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM sensor_readings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
