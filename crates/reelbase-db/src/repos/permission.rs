use anyhow::{Context, Result};
use sqlx::SqlitePool;

pub struct PermissionRepo;

impl PermissionRepo {
    pub async fn get_by_codename(pool: &SqlitePool, codename: &str) -> Result<Option<i64>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT permission_id FROM permission WHERE codename = $1")
                .bind(codename)
                .fetch_optional(pool)
                .await
                .context("Failed to get permission by codename")?;
        Ok(row.map(|(id,)| id))
    }

    /// Effective grants for a user: direct grants plus grants carried by
    /// any of the user's roles.
    pub async fn list_codenames_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT p.codename FROM permission p \
             JOIN user_permission up ON up.permission_id = p.permission_id \
             WHERE up.user_id = $1 \
             UNION \
             SELECT p.codename FROM permission p \
             JOIN role_permission rp ON rp.permission_id = p.permission_id \
             JOIN user_role ur ON ur.role_id = rp.role_id \
             WHERE ur.user_id = $2 \
             ORDER BY 1",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list permissions for user")?;
        Ok(rows.into_iter().map(|(codename,)| codename).collect())
    }
}
