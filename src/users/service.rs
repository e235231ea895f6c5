use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::password::{hash_password, verify_password},
    db::models::{User, UserRole},
    error::{is_unique_violation, ServiceError, ServiceResult},
};

const USER_COLUMNS: &str = "id, username, password_hash, role";
const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Registration / admin-create payload. `role` is validated against
/// [`UserRole`] so unknown names are rejected with a readable message.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    UserRole::User.as_str().to_owned()
}

pub(crate) fn check_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ServiceResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create(&self, input: NewUser) -> ServiceResult<User> {
        let username = input.username.trim();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "Username must be at least {MIN_USERNAME_LEN} characters."
            )));
        }
        check_password(&input.password)?;
        let role: UserRole = input.role.parse()?;

        if self.find_by_username(username).await?.is_some() {
            return Err(already_exists());
        }
        let password_hash = hash_password(&input.password)?;

        // The unique index still guards against a concurrent insert.
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                already_exists()
            } else {
                ServiceError::from(e)
            }
        })?;

        info!(user_id = user.id, username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    /// Returns the user when `password` matches the stored hash.
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<Option<User>> {
        let user = self.find_by_username(username).await?;
        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    pub async fn update_role(&self, id: i64, role: UserRole) -> ServiceResult<bool> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn reset_password(&self, id: i64, new_password: &str) -> ServiceResult<bool> {
        check_password(new_password)?;
        let hash = hash_password(new_password)?;
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            info!(user_id = id, "Password reset");
        }
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn already_exists() -> ServiceError {
    ServiceError::InvalidInput("User already exists.".to_owned())
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;

    fn new_user(username: &str, role: &str) -> NewUser {
        NewUser {
            username: username.to_owned(),
            password: "hunter22".to_owned(),
            role: role.to_owned(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_hashes_password_and_trims_name(pool: SqlitePool) {
        let service = UserService::new(pool);
        let user = service.create(new_user("  alice ", "Admin")).await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.role, UserRole::Admin);
        assert_ne!(user.password_hash, "hunter22");
        assert!(verify_password("hunter22", &user.password_hash));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_username_is_rejected(pool: SqlitePool) {
        let service = UserService::new(pool);
        service.create(new_user("alice", "User")).await.unwrap();

        let err = service.create(new_user("alice ", "User")).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_role_is_rejected(pool: SqlitePool) {
        let err = UserService::new(pool)
            .create(new_user("bob", "Operator"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid role. Allowed roles: Admin, User.");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn short_credentials_are_rejected(pool: SqlitePool) {
        let service = UserService::new(pool);
        assert!(service.create(new_user("al", "User")).await.is_err());

        let mut weak = new_user("alice", "User");
        weak.password = "12345".to_owned();
        assert!(matches!(
            service.create(weak).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn authenticate_checks_password(pool: SqlitePool) {
        let service = UserService::new(pool);
        service.create(new_user("alice", "User")).await.unwrap();

        assert!(service.authenticate("alice", "hunter22").await.unwrap().is_some());
        assert!(service.authenticate("alice", "wrong-pass").await.unwrap().is_none());
        assert!(service.authenticate("nobody", "hunter22").await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn role_update_and_password_reset(pool: SqlitePool) {
        let service = UserService::new(pool);
        let user = service.create(new_user("alice", "User")).await.unwrap();

        assert!(service.update_role(user.id, UserRole::Admin).await.unwrap());
        assert!(service.reset_password(user.id, "s3cret!!").await.unwrap());

        let stored = service.get(user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, UserRole::Admin);
        assert!(verify_password("s3cret!!", &stored.password_hash));

        assert!(!service.update_role(999, UserRole::User).await.unwrap());
        assert!(!service.reset_password(999, "s3cret!!").await.unwrap());
        assert!(service.delete(user.id).await.unwrap());
        assert!(!service.delete(user.id).await.unwrap());
    }
}
