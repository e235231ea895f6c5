use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::errors::AppError,
    auth::AuthUser,
    social::{ShareRequest, ShareResult, SocialService},
};

/// Posts an incident update to a configured social network.
#[utoipa::path(
    post,
    path = "/api/social/incidents/{id}/share",
    params(("id" = i64, Path, description = "Incident id")),
    request_body = ShareRequest,
    responses(
        (status = 200, description = "Share attempt result", body = ShareResult),
        (status = 400, description = "Unknown incident, unconfigured network or message too long"),
    ),
    security(("bearer" = [])),
    tag = "social"
)]
pub async fn share_incident(
    State(social): State<SocialService>,
    Path(id): Path<i64>,
    _user: AuthUser,
    Json(request): Json<ShareRequest>,
) -> Result<Json<ShareResult>, AppError> {
    Ok(Json(social.share_incident(id, request).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::{
        db::models::UserRole,
        test_support::{test_server, token_for},
    };

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_incident_is_bad_request(pool: SqlitePool) {
        let server = test_server(pool);
        let resp = server
            .post("/api/social/incidents/12/share")
            .authorization_bearer(token_for("alice", UserRole::User))
            .json(&json!({ "network": "X" }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(resp.json::<Value>()["error"], "Incident 12 not found.");
    }
}
