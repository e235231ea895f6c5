//! Incident sharing to the social networks configured in `SOCIAL_NETWORKS`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    config::SocialNetwork,
    error::{ServiceError, ServiceResult},
};

pub const MAX_MESSAGE_LEN: usize = 240;
const RESPONSE_PREVIEW_LEN: usize = 200;
const UNKNOWN_BUILDING: &str = "Unknown building";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShareRequest {
    /// Configured network name, matched case-insensitively.
    pub network: String,
    /// Defaults to a generated status update when absent or blank.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShareResult {
    pub network: String,
    /// JSON body that was posted.
    pub payload_preview: String,
    pub share_url: String,
    pub sent_at_utc: DateTime<Utc>,
    /// `None` when the request never got a response.
    pub external_status_code: Option<u16>,
    pub external_response_preview: String,
}

/// Body posted to the network's API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SharePayload<'a> {
    incident_id: i64,
    building: &'a str,
    status: &'a str,
    message: &'a str,
    network: &'a str,
}

#[derive(FromRow)]
struct IncidentSummary {
    id: i64,
    incident_type: String,
    status: String,
    building_name: Option<String>,
}

fn default_message(incident: &IncidentSummary, building: &str) -> String {
    format!(
        "Update on incident '{}' at {} (status: {}).",
        incident.incident_type, building, incident.status
    )
}

fn preview(text: &str) -> String {
    text.chars().take(RESPONSE_PREVIEW_LEN).collect()
}

#[derive(Clone)]
pub struct SocialService {
    pool: SqlitePool,
    http: Client,
    networks: Arc<Vec<SocialNetwork>>,
}

impl SocialService {
    pub fn new(pool: SqlitePool, http: Client, networks: Vec<SocialNetwork>) -> Self {
        Self {
            pool,
            http,
            networks: Arc::new(networks),
        }
    }

    fn network(&self, name: &str) -> Option<&SocialNetwork> {
        let name = name.trim();
        self.networks
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }

    pub async fn share_incident(
        &self,
        incident_id: i64,
        request: ShareRequest,
    ) -> ServiceResult<ShareResult> {
        let incident = sqlx::query_as::<_, IncidentSummary>(
            "SELECT i.id, i.type AS incident_type, i.status, b.name AS building_name \
             FROM incidents i \
             LEFT JOIN buildings b ON b.id = i.building_id \
             WHERE i.id = ?",
        )
        .bind(incident_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            ServiceError::InvalidOperation(format!("Incident {incident_id} not found."))
        })?;

        let network = self.network(&request.network).ok_or_else(|| {
            ServiceError::InvalidOperation(format!(
                "Social network '{}' is not configured.",
                request.network
            ))
        })?;

        let building = incident.building_name.as_deref().unwrap_or(UNKNOWN_BUILDING);
        let message = match request.message.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m.to_owned(),
            _ => default_message(&incident, building),
        };
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "Message must be at most {MAX_MESSAGE_LEN} characters."
            )));
        }

        let payload = SharePayload {
            incident_id: incident.id,
            building,
            status: &incident.status,
            message: &message,
            network: &network.name,
        };
        let payload_json = serde_json::to_string(&payload)?;

        let mut req = self
            .http
            .post(&network.api_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload_json.clone());
        if let Some(key) = &network.api_key {
            req = req.bearer_auth(key);
        }

        let (external_status_code, external_response_preview) = match req.send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("Error reading response: {e}"));
                (Some(status), preview(&body))
            }
            Err(e) => {
                warn!(network = %network.name, incident_id, error = %e, "Share request failed");
                (None, preview(&format!("Error: {e}")))
            }
        };

        info!(
            network = %network.name,
            incident_id,
            status_code = ?external_status_code,
            "Incident shared"
        );

        Ok(ShareResult {
            network: network.name.clone(),
            payload_preview: payload_json,
            share_url: network.api_url.clone(),
            sent_at_utc: Utc::now(),
            external_status_code,
            external_response_preview,
        })
    }
}
