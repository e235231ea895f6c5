pub mod alerts;
pub mod auth;
pub mod buildings;
pub mod incidents;
pub mod portability;
pub mod readings;
pub mod reports;
pub mod sensors;
pub mod soap;
pub mod social;
pub mod users;

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::dto::{
    BuildingDetailsDto, ChangePasswordRequest, LoginRequest, MessageResponse, TokenResponse,
    UserDto, UserUpdateRequest,
};
use crate::{
    alerts::AlertInput,
    buildings::BuildingInput,
    db::models::{Alert, Building, Incident, Sensor, SensorReading, UserRole},
    incidents::IncidentInput,
    portability::{ImportSummary, ReadingImport},
    readings::ReadingInput,
    reports::{BuildingLoad, DashboardSnapshot},
    sensors::{NewSensor, SensorUpdate},
    social::{ShareRequest, ShareResult},
    users::NewUser,
    weather::WeatherDto,
};

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI document
// ---------------------------------------------------------------------------

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        buildings::list_buildings, buildings::get_building, buildings::create_building,
        buildings::update_building, buildings::delete_building,
        sensors::list_sensors, sensors::get_sensor, sensors::create_sensor,
        sensors::update_sensor, sensors::delete_sensor,
        readings::list_readings, readings::get_reading, readings::create_reading,
        readings::update_reading, readings::delete_reading,
        alerts::list_alerts, alerts::get_alert, alerts::create_alert,
        alerts::update_alert, alerts::delete_alert,
        incidents::list_incidents, incidents::get_incident, incidents::create_incident,
        incidents::update_incident, incidents::delete_incident,
        users::list_users, users::get_user, users::create_user,
        users::update_user, users::delete_user,
        reports::dashboard, reports::export_alerts, reports::export_incidents,
        portability::export_readings, portability::import_readings,
        social::share_incident,
        auth::register, auth::login, auth::me, auth::change_password,
    ),
    components(schemas(
        Building, BuildingInput, BuildingDetailsDto, WeatherDto,
        Sensor, NewSensor, SensorUpdate,
        SensorReading, ReadingInput,
        Alert, AlertInput,
        Incident, IncidentInput,
        UserRole, UserDto, NewUser, UserUpdateRequest,
        DashboardSnapshot, BuildingLoad,
        ReadingImport, ImportSummary,
        ShareRequest, ShareResult,
        LoginRequest, TokenResponse, ChangePasswordRequest, MessageResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "buildings", description = "Buildings and their current weather"),
        (name = "sensors", description = "Sensors installed in buildings"),
        (name = "readings", description = "Sensor readings"),
        (name = "alerts", description = "Sensor alerts"),
        (name = "incidents", description = "Building incidents"),
        (name = "users", description = "Account administration (admin only)"),
        (name = "reports", description = "Dashboard and CSV exports"),
        (name = "data-portability", description = "Sensor reading import/export"),
        (name = "social", description = "Incident sharing"),
        (name = "auth", description = "Registration, login and tokens"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "Building Safety API",
        version = "0.1.0",
        description = "REST API for building safety monitoring: buildings, sensors, alerts and incidents"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use sqlx::SqlitePool;

    use crate::test_support::test_server;

    #[sqlx::test(migrations = "./migrations")]
    async fn health_is_public(pool: SqlitePool) {
        let resp = test_server(pool).get("/health").await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>()["status"], "ok");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn openapi_document_lists_routes(pool: SqlitePool) {
        let resp = test_server(pool).get("/api-docs/openapi.json").await;
        resp.assert_status_ok();
        let doc: Value = resp.json();
        assert!(doc["paths"]["/api/buildings/{id}"].is_object());
        assert!(doc["paths"]["/api/reports/dashboard"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }
}
