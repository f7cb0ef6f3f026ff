use anyhow::{Context, Result};
use sqlx::SqlitePool;

pub struct RoleRepo;

impl RoleRepo {
    /// Roles are created lazily on first reference
    pub async fn get_or_create(pool: &SqlitePool, name: &str) -> Result<i64> {
        sqlx::query("INSERT INTO role (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(pool)
            .await
            .context("Failed to create role")?;
        let (role_id,): (i64,) = sqlx::query_as("SELECT role_id FROM role WHERE name = $1")
            .bind(name)
            .fetch_one(pool)
            .await
            .context("Failed to look up role")?;
        Ok(role_id)
    }

    pub async fn list_names_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT r.name FROM role r \
             JOIN user_role ur ON ur.role_id = r.role_id \
             WHERE ur.user_id = $1 ORDER BY r.name",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list roles for user")?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    pub async fn grant_permission(
        pool: &SqlitePool,
        role_id: i64,
        permission_id: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO role_permission (role_id, permission_id) VALUES ($1, $2) \
             ON CONFLICT (role_id, permission_id) DO NOTHING",
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(pool)
        .await
        .context("Failed to grant permission to role")?;
        Ok(())
    }
}
