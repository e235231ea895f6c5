use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    db::models::Sensor,
    error::{is_foreign_key_violation, ServiceError, ServiceResult},
};

const SENSOR_COLUMNS: &str = "id, name, type, is_active, building_id";
const MAX_NAME_LEN: usize = 100;

/// Request body for `POST /api/sensors`. New sensors start active.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSensor {
    pub name: String,
    /// e.g. `Smoke`, `Temperature`, `Flood`.
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub building_id: i64,
}

/// Request body for `PUT /api/sensors/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SensorUpdate {
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: String,
    #[serde(default)]
    pub is_active: bool,
    pub building_id: i64,
}

fn validate(name: &str, sensor_type: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Sensor name is required.".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::InvalidInput(format!(
            "Sensor name cannot exceed {MAX_NAME_LEN} characters."
        )));
    }
    if sensor_type.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Sensor type is required.".into()));
    }
    Ok(())
}

fn missing_building(building_id: i64) -> ServiceError {
    ServiceError::InvalidInput(format!(
        "Building {building_id} does not exist. Create the building first."
    ))
}

#[derive(Clone)]
pub struct SensorService {
    pool: SqlitePool,
}

impl SensorService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Sensor>> {
        let rows =
            sqlx::query_as::<_, Sensor>(&format!("SELECT {SENSOR_COLUMNS} FROM sensors ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Option<Sensor>> {
        let row = sqlx::query_as::<_, Sensor>(&format!(
            "SELECT {SENSOR_COLUMNS} FROM sensors WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Fails with [`ServiceError::InvalidInput`] when `building_id` does not
    /// reference an existing building.
    pub async fn create(&self, input: NewSensor) -> ServiceResult<Sensor> {
        validate(&input.name, &input.sensor_type)?;

        let sensor = sqlx::query_as::<_, Sensor>(&format!(
            "INSERT INTO sensors (name, type, is_active, building_id) \
             VALUES (?, ?, 1, ?) RETURNING {SENSOR_COLUMNS}"
        ))
        .bind(input.name.trim())
        .bind(input.sensor_type.trim())
        .bind(input.building_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_building(input.building_id)
            } else {
                e.into()
            }
        })?;

        info!(sensor_id = sensor.id, building_id = sensor.building_id, "Sensor created");
        Ok(sensor)
    }

    pub async fn update(&self, id: i64, input: SensorUpdate) -> ServiceResult<bool> {
        validate(&input.name, &input.sensor_type)?;

        let result = sqlx::query(
            "UPDATE sensors SET name = ?, type = ?, is_active = ?, building_id = ? WHERE id = ?",
        )
        .bind(input.name.trim())
        .bind(input.sensor_type.trim())
        .bind(input.is_active)
        .bind(input.building_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_building(input.building_id)
            } else {
                e.into()
            }
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the sensor with all of its readings and alerts, atomically.
    pub async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM sensors WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let readings = sqlx::query("DELETE FROM sensor_readings WHERE sensor_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let alerts = sqlx::query("DELETE FROM alerts WHERE sensor_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM sensors WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(sensor_id = id, readings, alerts, "Sensor deleted with its readings and alerts");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::SqlitePool;

    use super::*;
    use crate::test_support::{count, insert_alert, insert_building, insert_reading, insert_sensor};

    fn new_sensor(building_id: i64) -> NewSensor {
        NewSensor {
            name: "Kitchen smoke".to_owned(),
            sensor_type: "Smoke".to_owned(),
            building_id,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_defaults_to_active(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let service = SensorService::new(pool);

        let sensor = service.create(new_sensor(building)).await.unwrap();
        assert!(sensor.is_active);
        assert_eq!(sensor.building_id, building);
        assert_eq!(sensor.sensor_type, "Smoke");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_with_unknown_building_is_invalid_input(pool: SqlitePool) {
        let service = SensorService::new(pool.clone());
        let err = service.create(new_sensor(404)).await.unwrap_err();

        match err {
            ServiceError::InvalidInput(msg) => assert!(msg.contains("Building 404")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(count(&pool, "sensors").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_rejects_overlong_name(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let service = SensorService::new(pool);

        let mut input = new_sensor(building);
        input.name = "x".repeat(101);
        assert!(matches!(
            service.create(input).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_toggles_active_flag(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let id = insert_sensor(&pool, building, "S1", true).await;
        let service = SensorService::new(pool);

        let updated = service
            .update(
                id,
                SensorUpdate {
                    name: "S1 renamed".to_owned(),
                    sensor_type: "Temperature".to_owned(),
                    is_active: false,
                    building_id: building,
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let sensor = service.get(id).await.unwrap().unwrap();
        assert!(!sensor.is_active);
        assert_eq!(sensor.name, "S1 renamed");
        assert_eq!(sensor.sensor_type, "Temperature");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn update_missing_returns_false(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let service = SensorService::new(pool);
        let found = service
            .update(
                99,
                SensorUpdate {
                    name: "x".to_owned(),
                    sensor_type: "Smoke".to_owned(),
                    is_active: true,
                    building_id: building,
                },
            )
            .await
            .unwrap();
        assert!(!found);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_removes_readings_and_alerts(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let sensor = insert_sensor(&pool, building, "S1", true).await;
        insert_reading(&pool, sensor, 1.5, Utc::now()).await;
        insert_reading(&pool, sensor, 2.5, Utc::now()).await;
        insert_alert(&pool, sensor, "Smoke", false, Utc::now()).await;

        let service = SensorService::new(pool.clone());
        assert!(service.delete(sensor).await.unwrap());

        assert_eq!(count(&pool, "sensors").await, 0);
        assert_eq!(count(&pool, "sensor_readings").await, 0);
        assert_eq!(count(&pool, "alerts").await, 0);
        assert_eq!(count(&pool, "buildings").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn failed_delete_rolls_back_readings_and_alerts(pool: SqlitePool) {
        let building = insert_building(&pool, "HQ").await;
        let sensor = insert_sensor(&pool, building, "S1", true).await;
        insert_reading(&pool, sensor, 1.5, Utc::now()).await;
        insert_alert(&pool, sensor, "Smoke", false, Utc::now()).await;
        sqlx::query(
            "CREATE TRIGGER block_sensor_delete BEFORE DELETE ON sensors \
             BEGIN SELECT RAISE(ABORT, 'sensor delete blocked'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let service = SensorService::new(pool.clone());
        assert!(matches!(
            service.delete(sensor).await.unwrap_err(),
            ServiceError::Database(_)
        ));

        assert_eq!(count(&pool, "sensors").await, 1);
        assert_eq!(count(&pool, "sensor_readings").await, 1);
        assert_eq!(count(&pool, "alerts").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_missing_returns_false(pool: SqlitePool) {
        let service = SensorService::new(pool);
        assert!(!service.delete(1).await.unwrap());
    }
}
