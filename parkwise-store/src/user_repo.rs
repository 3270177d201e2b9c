use async_trait::async_trait;
use parkwise_core::model::{NewUser, Role, User};
use parkwise_core::repository::UserRepository;
use parkwise_core::{CoreError, CoreResult};
use sqlx::SqlitePool;
use tracing::info;

use crate::db_err;
use crate::rows::UserRow;

pub struct StoreUserRepository {
    pool: SqlitePool,
}

impl StoreUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn create_user(&self, user: &NewUser) -> CoreResult<User> {
        user.validate()?;
        let email = normalize_email(&user.email);
        let username = user.username.trim();

        let result = sqlx::query(
            "INSERT INTO users (username, email, password, role) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(&email)
        .bind(user.password.expose())
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| match db_err(e) {
            CoreError::ConflictError(_) => CoreError::ConflictError("email already registered".into()),
            other => other,
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            email,
            password: user.password.clone(),
            role: user.role,
        })
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password, role FROM users WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_id(&self, id: i64) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password, role FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn list_users(&self, role: Role) -> CoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password, role FROM users WHERE role = ? ORDER BY id",
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn count_users(&self, role: Role) -> CoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count)
    }

    async fn ensure_admin(&self, admin: &NewUser) -> CoreResult<bool> {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE role = 'admin' LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        if existing.is_some() {
            return Ok(false);
        }

        let seeded = NewUser { role: Role::Admin, ..admin.clone() };
        let user = self.create_user(&seeded).await?;
        info!("Created default admin account {}", user.email);
        Ok(true)
    }
}
