use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use building_safety_service::{
    api,
    auth::JwtManager,
    config::Config,
    db,
    social::SocialService,
    state::AppState,
    weather::{WeatherClient, HTTP_TIMEOUT},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Env vars may also be set externally.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");

    // One connection pool for both outbound integrations.
    let http = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    if config.openweather_api_key.is_empty() {
        info!("OPENWEATHER_API_KEY not set, building details will carry no weather");
    }
    info!(
        networks = config.social_networks.len(),
        "Social sharing configured"
    );

    let state = AppState {
        jwt: JwtManager::new(&config.jwt),
        weather: WeatherClient::new(
            http.clone(),
            &config.openweather_base_url,
            &config.openweather_api_key,
        ),
        social: SocialService::new(pool.clone(), http, config.social_networks.clone()),
        pool,
    };

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
