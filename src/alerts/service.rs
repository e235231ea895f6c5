use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    db::models::Alert,
    error::{is_foreign_key_violation, ServiceError, ServiceResult},
    readings::missing_sensor,
};

const ALERT_COLUMNS: &str = "id, timestamp, message, severity, is_resolved, sensor_id";

/// Request body for creating or replacing an alert.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AlertInput {
    /// Defaults to the current UTC time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub message: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default)]
    pub is_resolved: bool,
    pub sensor_id: i64,
}

fn default_severity() -> String {
    "Warning".to_owned()
}

#[derive(Clone)]
pub struct AlertService {
    pool: SqlitePool,
}

impl AlertService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Alert>> {
        let rows = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY timestamp DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Option<Alert>> {
        let row = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, input: AlertInput) -> ServiceResult<Alert> {
        let alert = sqlx::query_as::<_, Alert>(&format!(
            "INSERT INTO alerts (timestamp, message, severity, is_resolved, sensor_id) \
             VALUES (?, ?, ?, ?, ?) RETURNING {ALERT_COLUMNS}"
        ))
        .bind(input.timestamp.unwrap_or_else(Utc::now))
        .bind(&input.message)
        .bind(&input.severity)
        .bind(input.is_resolved)
        .bind(input.sensor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_sensor(input.sensor_id)
            } else {
                ServiceError::from(e)
            }
        })?;

        info!(alert_id = alert.id, sensor_id = alert.sensor_id, severity = %alert.severity, "Alert raised");
        Ok(alert)
    }

    pub async fn update(&self, id: i64, input: AlertInput) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE alerts \
             SET message = ?, severity = ?, is_resolved = ?, timestamp = ?, sensor_id = ? \
             WHERE id = ?",
        )
        .bind(&input.message)
        .bind(&input.severity)
        .bind(input.is_resolved)
        .bind(input.timestamp.unwrap_or_else(Utc::now))
        .bind(input.sensor_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_sensor(input.sensor_id)
            } else {
                ServiceError::from(e)
            }
        })?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM alerts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::test_support::{insert_building, insert_sensor};

    fn alert(sensor_id: i64) -> AlertInput {
        AlertInput {
            timestamp: None,
            message: "Smoke above threshold".to_owned(),
            severity: "Critical".to_owned(),
            is_resolved: false,
            sensor_id,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_then_resolve(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let sensor = insert_sensor(&pool, building, "S1", true).await;
        let service = AlertService::new(pool);

        let created = service.create(alert(sensor)).await.unwrap();
        assert!(!created.is_resolved);
        assert_eq!(created.severity, "Critical");

        let mut resolved = alert(sensor);
        resolved.is_resolved = true;
        assert!(service.update(created.id, resolved).await.unwrap());
        assert!(service.get(created.id).await.unwrap().unwrap().is_resolved);
    }

    #[test]
    fn severity_defaults_to_warning() {
        let input: AlertInput =
            serde_json::from_value(serde_json::json!({ "message": "hot", "sensor_id": 1 }))
                .unwrap();
        assert_eq!(input.severity, "Warning");
        assert!(!input.is_resolved);
        assert!(input.timestamp.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_for_unknown_sensor_is_invalid_input(pool: SqlitePool) {
        let err = AlertService::new(pool).create(alert(5)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn missing_alert_is_none_and_not_found(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let sensor = insert_sensor(&pool, building, "S1", true).await;
        let service = AlertService::new(pool);

        assert!(service.get(3).await.unwrap().is_none());
        assert!(!service.update(3, alert(sensor)).await.unwrap());
        assert!(!service.delete(3).await.unwrap());
    }
}
