use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Incident status that marks an incident as closed. Every other status
/// (`Reported`, `Open`, ...) counts as open.
pub const RESOLVED_STATUS: &str = "Resolved";

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Building {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Dominant hazard for the site, e.g. `Fire` or `Flood`.
    pub risk_type: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Sensor {
    pub id: i64,
    pub name: String,
    /// Free-form device category (`Smoke`, `Temperature`, `Flood`, ...).
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub is_active: bool,
    pub building_id: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SensorReading {
    pub id: i64,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub sensor_id: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// `Warning` or `Critical`.
    pub severity: String,
    pub is_resolved: bool,
    pub sensor_id: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Incident {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub incident_type: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub severity: String,
    pub status: String,
    pub description: String,
    pub building_id: i64,
}

impl Incident {
    pub fn is_open(&self) -> bool {
        self.status != RESOLVED_STATUS
    }
}

/// Stored as its variant name (`Admin` / `User`) in a `TEXT` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::User => "User",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = crate::error::ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Self::Admin),
            "User" => Ok(Self::User),
            _ => Err(crate::error::ServiceError::InvalidInput(
                "Invalid role. Allowed roles: Admin, User.".to_owned(),
            )),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_only_known_names() {
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("User".parse::<UserRole>().unwrap(), UserRole::User);
        assert!("admin".parse::<UserRole>().is_err());
        assert!("Operator".parse::<UserRole>().is_err());
    }

    #[test]
    fn user_serialization_omits_password_hash() {
        let user = User {
            id: 1,
            username: "alice".into(),
            password_hash: "secret-hash".into(),
            role: UserRole::Admin,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "Admin");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn incident_open_unless_resolved() {
        let mut incident = Incident {
            id: 1,
            incident_type: "Fire".into(),
            started_at: Utc::now(),
            ended_at: None,
            severity: "High".into(),
            status: "Reported".into(),
            description: String::new(),
            building_id: 1,
        };
        assert!(incident.is_open());
        incident.status = RESOLVED_STATUS.into();
        assert!(!incident.is_open());
    }
}
