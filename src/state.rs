use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{auth::JwtManager, social::SocialService, weather::WeatherClient};

/// Shared per-process state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: JwtManager,
    pub weather: WeatherClient,
    pub social: SocialService,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for JwtManager {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl FromRef<AppState> for WeatherClient {
    fn from_ref(state: &AppState) -> Self {
        state.weather.clone()
    }
}

impl FromRef<AppState> for SocialService {
    fn from_ref(state: &AppState) -> Self {
        state.social.clone()
    }
}
