use axum::{extract::State, http::StatusCode, Json};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    api::{
        dto::{ChangePasswordRequest, LoginRequest, MessageResponse, TokenResponse, UserDto},
        errors::AppError,
    },
    auth::{password::verify_password, AuthUser, JwtManager},
    users::{NewUser, UserService},
};

/// Self-service sign-up. `role` defaults to `User`.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = NewUser,
    responses(
        (status = 201, description = "Account created", body = UserDto),
        (status = 400, description = "Invalid role, weak credentials or duplicate username"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<UserDto>), AppError> {
    let user = UserService::new(pool).create(input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token", body = TokenResponse),
        (status = 400, description = "Unknown user or wrong password"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(pool): State<SqlitePool>,
    State(jwt): State<JwtManager>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = UserService::new(pool)
        .authenticate(&input.username, &input.password)
        .await?
        .ok_or_else(|| AppError::bad_request("User not found or wrong password."))?;

    let token = jwt.issue(&user.username, user.role)?;
    info!(username = %user.username, "User logged in");
    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The caller's account", body = UserDto),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<Json<UserDto>, AppError> {
    UserService::new(pool)
        .find_by_username(&user.username)
        .await?
        .map(|u| Json(u.into()))
        .ok_or_else(|| AppError::not_found("User not found."))
}

#[utoipa::path(
    post,
    path = "/api/auth/changepassword",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Wrong current password or weak new password"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn change_password(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let users = UserService::new(pool);
    let account = users
        .find_by_username(&user.username)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;

    if !verify_password(&input.current_password, &account.password_hash) {
        return Err(AppError::bad_request("Current password is incorrect."));
    }
    users.reset_password(account.id, &input.new_password).await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully.".to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::test_support::test_server;

    async fn register(server: &TestServer, username: &str, password: &str, role: &str) -> StatusCode {
        server
            .post("/api/auth/register")
            .json(&json!({ "username": username, "password": password, "role": role }))
            .await
            .status_code()
    }

    async fn login(server: &TestServer, username: &str, password: &str) -> String {
        let resp = server
            .post("/api/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .await;
        resp.assert_status_ok();
        resp.json::<Value>()["token"].as_str().unwrap().to_owned()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn register_login_me(pool: SqlitePool) {
        let server = test_server(pool);
        assert_eq!(register(&server, "alice", "secret1", "Admin").await, StatusCode::CREATED);

        let token = login(&server, "alice", "secret1").await;
        let resp = server.get("/api/auth/me").authorization_bearer(&token).await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "Admin");
        assert!(body.get("password_hash").is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn register_rejects_bad_role_and_duplicates(pool: SqlitePool) {
        let server = test_server(pool);

        let resp = server
            .post("/api/auth/register")
            .json(&json!({ "username": "bob", "password": "secret1", "role": "Root" }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.json::<Value>()["error"],
            "Invalid role. Allowed roles: Admin, User."
        );

        assert_eq!(register(&server, "bob", "secret1", "User").await, StatusCode::CREATED);
        assert_eq!(register(&server, "bob", "secret2", "User").await, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn wrong_password_is_bad_request(pool: SqlitePool) {
        let server = test_server(pool);
        register(&server, "carol", "secret1", "User").await;

        let resp = server
            .post("/api/auth/login")
            .json(&json!({ "username": "carol", "password": "nope!!" }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(resp.json::<Value>()["error"], "User not found or wrong password.");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn change_password_checks_current(pool: SqlitePool) {
        let server = test_server(pool);
        register(&server, "dave", "secret1", "User").await;
        let token = login(&server, "dave", "secret1").await;

        server
            .post("/api/auth/changepassword")
            .authorization_bearer(&token)
            .json(&json!({ "current_password": "wrong!!", "new_password": "secret2" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/auth/changepassword")
            .authorization_bearer(&token)
            .json(&json!({ "current_password": "secret1", "new_password": "secret2" }))
            .await
            .assert_status_ok();

        login(&server, "dave", "secret2").await;
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn me_requires_token(pool: SqlitePool) {
        test_server(pool)
            .get("/api/auth/me")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
