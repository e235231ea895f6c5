//! Row-seeding helpers and an in-process server shared by the `#[sqlx::test]` suites.

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use reqwest::Client;
use sqlx::SqlitePool;

use crate::{
    api::router,
    auth::JwtManager,
    config::JwtSettings,
    db::models::UserRole,
    social::SocialService,
    state::AppState,
    weather::WeatherClient,
};

fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "test-secret-with-enough-entropy-0123456789".to_owned(),
        issuer: "building-safety".to_owned(),
        audience: "building-safety-clients".to_owned(),
        ttl_hours: 1,
    }
}

/// State with no weather key (lookups degrade to an error description)
/// and no social networks configured.
pub fn test_state(pool: SqlitePool) -> AppState {
    let http = Client::new();
    AppState {
        jwt: JwtManager::new(&jwt_settings()),
        weather: WeatherClient::new(http.clone(), "http://127.0.0.1:1", ""),
        social: SocialService::new(pool.clone(), http, Vec::new()),
        pool,
    }
}

pub fn test_server(pool: SqlitePool) -> TestServer {
    TestServer::new(router(test_state(pool))).unwrap()
}

/// A bearer token the server built by [`test_server`] accepts.
pub fn token_for(username: &str, role: UserRole) -> String {
    JwtManager::new(&jwt_settings()).issue(username, role).unwrap()
}

pub async fn insert_building(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO buildings (name, address, latitude, longitude, risk_type) \
         VALUES (?, 'Main St 1', 38.72, -9.14, 'Fire') RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_sensor(pool: &SqlitePool, building_id: i64, name: &str, is_active: bool) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO sensors (name, type, is_active, building_id) \
         VALUES (?, 'Smoke', ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(is_active)
    .bind(building_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_reading(
    pool: &SqlitePool,
    sensor_id: i64,
    value: f64,
    timestamp: DateTime<Utc>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO sensor_readings (value, timestamp, sensor_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(value)
    .bind(timestamp)
    .bind(sensor_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_alert(
    pool: &SqlitePool,
    sensor_id: i64,
    message: &str,
    is_resolved: bool,
    timestamp: DateTime<Utc>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO alerts (timestamp, message, severity, is_resolved, sensor_id) \
         VALUES (?, ?, 'Warning', ?, ?) RETURNING id",
    )
    .bind(timestamp)
    .bind(message)
    .bind(is_resolved)
    .bind(sensor_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_incident(
    pool: &SqlitePool,
    building_id: i64,
    incident_type: &str,
    status: &str,
    description: &str,
    started_at: DateTime<Utc>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO incidents (type, started_at, severity, status, description, building_id) \
         VALUES (?, ?, 'High', ?, ?, ?) RETURNING id",
    )
    .bind(incident_type)
    .bind(started_at)
    .bind(status)
    .bind(description)
    .bind(building_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
