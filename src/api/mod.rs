pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;
use handlers::{
    alerts, auth, buildings, incidents, portability, readings, reports, sensors, soap, social,
    users, ApiDoc,
};

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/api/buildings",
            get(buildings::list_buildings).post(buildings::create_building),
        )
        .route(
            "/api/buildings/{id}",
            get(buildings::get_building)
                .put(buildings::update_building)
                .delete(buildings::delete_building),
        )
        .route(
            "/api/sensors",
            get(sensors::list_sensors).post(sensors::create_sensor),
        )
        .route(
            "/api/sensors/{id}",
            get(sensors::get_sensor)
                .put(sensors::update_sensor)
                .delete(sensors::delete_sensor),
        )
        .route(
            "/api/sensorreadings",
            get(readings::list_readings).post(readings::create_reading),
        )
        .route(
            "/api/sensorreadings/{id}",
            get(readings::get_reading)
                .put(readings::update_reading)
                .delete(readings::delete_reading),
        )
        .route("/api/alerts", get(alerts::list_alerts).post(alerts::create_alert))
        .route(
            "/api/alerts/{id}",
            get(alerts::get_alert)
                .put(alerts::update_alert)
                .delete(alerts::delete_alert),
        )
        .route(
            "/api/incidents",
            get(incidents::list_incidents).post(incidents::create_incident),
        )
        .route(
            "/api/incidents/{id}",
            get(incidents::get_incident)
                .put(incidents::update_incident)
                .delete(incidents::delete_incident),
        )
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/reports/dashboard", get(reports::dashboard))
        .route("/api/reports/export/alerts", get(reports::export_alerts))
        .route("/api/reports/export/incidents", get(reports::export_incidents))
        .route(
            "/api/data-portability/sensor-readings/export",
            get(portability::export_readings),
        )
        .route(
            "/api/data-portability/sensor-readings/import",
            post(portability::import_readings),
        )
        .route(
            "/api/social/incidents/{id}/share",
            post(social::share_incident),
        )
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/changepassword", post(auth::change_password))
        .route("/Service.asmx", post(soap::soap_endpoint))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(TraceLayer::new_for_http())
}
