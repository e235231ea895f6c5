use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    db::models::{Incident, RESOLVED_STATUS},
    error::{is_foreign_key_violation, ServiceError, ServiceResult},
};

const INCIDENT_COLUMNS: &str =
    "id, type, started_at, ended_at, severity, status, description, building_id";

/// Request body for creating or replacing an incident.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IncidentInput {
    /// e.g. `Fire`, `Flood`.
    #[serde(rename = "type")]
    pub incident_type: String,
    /// Defaults to the current UTC time.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub description: String,
    pub building_id: i64,
}

fn default_severity() -> String {
    "Low".to_owned()
}

fn default_status() -> String {
    "Reported".to_owned()
}

fn missing_building(building_id: i64) -> ServiceError {
    ServiceError::InvalidInput(format!("Building {building_id} does not exist."))
}

#[derive(Clone)]
pub struct IncidentService {
    pool: SqlitePool,
}

impl IncidentService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Incident>> {
        let rows = sqlx::query_as::<_, Incident>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents ORDER BY started_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Incidents whose status is anything other than `Resolved`.
    pub async fn list_unresolved(&self) -> ServiceResult<Vec<Incident>> {
        let rows = sqlx::query_as::<_, Incident>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE status <> ? \
             ORDER BY started_at DESC, id DESC"
        ))
        .bind(RESOLVED_STATUS)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Option<Incident>> {
        let row = sqlx::query_as::<_, Incident>(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, input: IncidentInput) -> ServiceResult<Incident> {
        if input.incident_type.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Incident type is required.".into()));
        }

        let incident = sqlx::query_as::<_, Incident>(&format!(
            "INSERT INTO incidents \
             (type, started_at, ended_at, severity, status, description, building_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {INCIDENT_COLUMNS}"
        ))
        .bind(input.incident_type.trim())
        .bind(input.started_at.unwrap_or_else(Utc::now))
        .bind(input.ended_at)
        .bind(&input.severity)
        .bind(&input.status)
        .bind(&input.description)
        .bind(input.building_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_building(input.building_id)
            } else {
                ServiceError::from(e)
            }
        })?;

        info!(
            incident_id = incident.id,
            building_id = incident.building_id,
            incident_type = %incident.incident_type,
            "Incident recorded"
        );
        Ok(incident)
    }

    /// Records a freshly reported incident starting now.
    pub async fn report(
        &self,
        incident_type: &str,
        description: &str,
        building_id: i64,
        severity: &str,
    ) -> ServiceResult<Incident> {
        self.create(IncidentInput {
            incident_type: incident_type.to_owned(),
            started_at: None,
            ended_at: None,
            severity: severity.to_owned(),
            status: default_status(),
            description: description.to_owned(),
            building_id,
        })
        .await
    }

    pub async fn update(&self, id: i64, input: IncidentInput) -> ServiceResult<bool> {
        let result = sqlx::query(
            "UPDATE incidents \
             SET type = ?, description = ?, building_id = ?, started_at = ?, ended_at = ?, \
                 status = ?, severity = ? \
             WHERE id = ?",
        )
        .bind(input.incident_type.trim())
        .bind(&input.description)
        .bind(input.building_id)
        .bind(input.started_at.unwrap_or_else(Utc::now))
        .bind(input.ended_at)
        .bind(&input.status)
        .bind(&input.severity)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                missing_building(input.building_id)
            } else {
                ServiceError::from(e)
            }
        })?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM incidents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
