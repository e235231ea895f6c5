use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// SocialNetwork
// ---------------------------------------------------------------------------

/// A network incidents can be shared to via `POST /api/social/incidents/{id}/share`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialNetwork {
    pub name: String,
    pub api_url: String,
    /// Sent as `Authorization: Bearer <key>` when present.
    pub api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub jwt: JwtSettings,
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    /// Format: `"name|api_url|api_key,name2|api_url2"` (the key is optional).
    pub social_networks: Vec<SocialNetwork>,
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Token lifetime in hours.
    pub ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            jwt: JwtSettings {
                secret: required("JWT_SECRET")?,
                issuer: optional("JWT_ISSUER", "building-safety"),
                audience: optional("JWT_AUDIENCE", "building-safety-clients"),
                ttl_hours: optional("JWT_TTL_HOURS", "24")
                    .parse()
                    .context("JWT_TTL_HOURS must be an integer")?,
            },
            openweather_api_key: optional("OPENWEATHER_API_KEY", ""),
            openweather_base_url: optional(
                "OPENWEATHER_BASE_URL",
                "https://api.openweathermap.org",
            ),
            social_networks: parse_social_networks(&optional("SOCIAL_NETWORKS", ""))?,
        })
    }
}

/// Parse `"name|url|key,name2|url2"` into a list of [`SocialNetwork`]s.
///
/// Returns an error immediately if any entry lacks a name or URL.
fn parse_social_networks(raw: &str) -> Result<Vec<SocialNetwork>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let mut parts = entry.split('|').map(str::trim);
            let name = parts.next().filter(|s| !s.is_empty());
            let api_url = parts.next().filter(|s| !s.is_empty());
            let (Some(name), Some(api_url)) = (name, api_url) else {
                anyhow::bail!(
                    "SOCIAL_NETWORKS entry must be 'name|api_url[|api_key]', got: {entry:?}"
                );
            };
            let api_key = parts.next().filter(|s| !s.is_empty()).map(str::to_owned);
            Ok(SocialNetwork {
                name: name.to_owned(),
                api_url: api_url.to_owned(),
                api_key,
            })
        })
        .collect()
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
