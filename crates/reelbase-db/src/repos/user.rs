use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// True when the error chain bottoms out in a UNIQUE constraint violation,
/// e.g. two registrations racing on the same username.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<sqlx::Error>()
            .and_then(|e| e.as_database_error())
            .is_some_and(|db| matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
    })
}

pub struct UserRepo;

impl UserRepo {
    /// Create a user together with its role membership and direct permission
    /// grants in a single transaction. Nothing is written if any insert
    /// fails, so registration is all-or-nothing.
    pub async fn create_with_grants(
        pool: &SqlitePool,
        user_id: &str,
        username: &str,
        password_hash: &str,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<()> {
        let mut tx = pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(r#"INSERT INTO "user" (user_id, username, password_hash) VALUES ($1, $2, $3)"#)
            .bind(user_id)
            .bind(username)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .context("Failed to create user")?;

        sqlx::query("INSERT INTO user_role (user_id, role_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .context("Failed to attach role")?;

        for permission_id in permission_ids {
            sqlx::query("INSERT INTO user_permission (user_id, permission_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await
                .context("Failed to attach permission")?;
        }

        tx.commit().await.context("Failed to commit registration")?;
        Ok(())
    }

    pub async fn get_by_username(pool: &SqlitePool, username: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT user_id, username, password_hash, created_at FROM "user" WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by username")?;
        Ok(row)
    }

    pub async fn get_by_id(pool: &SqlitePool, user_id: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT user_id, username, password_hash, created_at FROM "user" WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by id")?;
        Ok(row)
    }
}
