use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    db::models::{Building, User, UserRole},
    weather::WeatherDto,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct BuildingDetailsDto {
    pub building: Building,
    pub current_weather: WeatherDto,
}

/// User as exposed over the API; never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            role: u.role,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub role: String,
    /// Replaces the password when present and non-empty.
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// HS256 bearer token.
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// Restrict the export to a single sensor.
    #[serde(rename = "sensorId")]
    pub sensor_id: Option<i64>,
}
