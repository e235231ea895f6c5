use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    db::models::Building,
    error::{ServiceError, ServiceResult},
};

const BUILDING_COLUMNS: &str = "id, name, address, latitude, longitude, risk_type";

/// Request body for creating or replacing a building.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BuildingInput {
    /// Optional on update; when present it must equal the path id.
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default = "default_risk_type")]
    pub risk_type: String,
}

fn default_risk_type() -> String {
    "None".to_owned()
}

impl BuildingInput {
    fn validate(&self) -> ServiceResult<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Building name is required.".into()));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct BuildingService {
    pool: SqlitePool,
}

impl BuildingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Building>> {
        let rows = sqlx::query_as::<_, Building>(&format!(
            "SELECT {BUILDING_COLUMNS} FROM buildings ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Option<Building>> {
        let row = sqlx::query_as::<_, Building>(&format!(
            "SELECT {BUILDING_COLUMNS} FROM buildings WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, input: BuildingInput) -> ServiceResult<Building> {
        input.validate()?;
        let building = sqlx::query_as::<_, Building>(&format!(
            "INSERT INTO buildings (name, address, latitude, longitude, risk_type) \
             VALUES (?, ?, ?, ?, ?) RETURNING {BUILDING_COLUMNS}"
        ))
        .bind(input.name.trim())
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.risk_type)
        .fetch_one(&self.pool)
        .await?;

        info!(building_id = building.id, name = %building.name, "Building created");
        Ok(building)
    }

    /// Returns `false` when no building has this id.
    pub async fn update(&self, id: i64, input: BuildingInput) -> ServiceResult<bool> {
        if input.id.is_some_and(|body_id| body_id != id) {
            return Err(ServiceError::InvalidInput(
                "The URL id does not match the body id.".into(),
            ));
        }
        input.validate()?;

        let result = sqlx::query(
            "UPDATE buildings \
             SET name = ?, address = ?, latitude = ?, longitude = ?, risk_type = ? \
             WHERE id = ?",
        )
        .bind(input.name.trim())
        .bind(&input.address)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.risk_type)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the building together with its incidents, its sensors and
    /// every reading and alert of those sensors, in one transaction.
    ///
    /// Returns `false` (and touches nothing) when the building is absent.
    pub async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM buildings WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let incidents = sqlx::query("DELETE FROM incidents WHERE building_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let readings = sqlx::query(
            "DELETE FROM sensor_readings \
             WHERE sensor_id IN (SELECT id FROM sensors WHERE building_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let alerts = sqlx::query(
            "DELETE FROM alerts \
             WHERE sensor_id IN (SELECT id FROM sensors WHERE building_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let sensors = sqlx::query("DELETE FROM sensors WHERE building_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM buildings WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            building_id = id,
            incidents, sensors, readings, alerts, "Building deleted with its dependents"
        );
        Ok(true)
    }
}
