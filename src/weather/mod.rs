//! Current-weather lookup against the OpenWeather `data/2.5/weather` API.

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Outbound request timeout shared by the integration clients.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Weather at a building's coordinates. On failure only `description` is
/// meaningful and explains what went wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherDto {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    pub description: String,
}

impl WeatherDto {
    fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            description: reason.into(),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
struct OpenWeatherResponse {
    main: OpenWeatherMain,
    weather: Vec<OpenWeatherCondition>,
}

#[derive(Deserialize)]
struct OpenWeatherMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct OpenWeatherCondition {
    description: String,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(http: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_owned(),
                api_key: api_key.trim().to_owned(),
            }),
        }
    }

    /// Never fails: every error is folded into the returned description.
    pub async fn current_weather(&self, latitude: f64, longitude: f64) -> WeatherDto {
        if self.inner.api_key.is_empty() {
            return WeatherDto::unavailable("Error: the weather API key is not configured.");
        }

        match self.fetch(latitude, longitude).await {
            Ok(dto) => dto,
            Err(e) => {
                warn!(latitude, longitude, error = %format!("{e:#}"), "Weather lookup failed");
                WeatherDto::unavailable(format!("Error: {e:#}"))
            }
        }
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherDto> {
        let url = format!("{}/data/2.5/weather", self.inner.base_url);
        debug!(url = %url, latitude, longitude, "Requesting current weather");

        // Transport errors would otherwise echo the URL, appid included.
        let resp = self
            .inner
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.inner.api_key.clone()),
                ("units", "metric".to_owned()),
            ])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("weather request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to read weather response body")?;
        if !status.is_success() {
            bail!("weather API returned {status}: {body}");
        }

        let parsed: OpenWeatherResponse =
            serde_json::from_str(&body).context("failed to parse weather response")?;
        Ok(WeatherDto {
            temperature: parsed.main.temp,
            humidity: parsed.main.humidity,
            description: parsed
                .weather
                .into_iter()
                .next()
                .map(|c| c.description)
                .unwrap_or_default(),
        })
    }
}
