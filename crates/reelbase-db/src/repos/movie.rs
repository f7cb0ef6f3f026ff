use anyhow::{Context, Result};
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MovieRow {
    pub movie_id: i64,
    pub title: String,
    pub image_url: String,
    pub movie_url: String,
}

pub struct MovieRepo;

impl MovieRepo {
    /// Inserts unconditionally; duplicates are allowed
    pub async fn insert(
        pool: &SqlitePool,
        title: &str,
        image_url: &str,
        movie_url: &str,
    ) -> Result<MovieRow> {
        let row = sqlx::query_as::<_, MovieRow>(
            "INSERT INTO movie (title, image_url, movie_url) VALUES ($1, $2, $3) \
             RETURNING movie_id, title, image_url, movie_url",
        )
        .bind(title)
        .bind(image_url)
        .bind(movie_url)
        .fetch_one(pool)
        .await
        .context("Failed to insert movie")?;
        Ok(row)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movie")
            .fetch_one(pool)
            .await
            .context("Failed to count movies")?;
        Ok(count)
    }

    /// Insertion order, ascending
    pub async fn list_page(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<MovieRow>> {
        let rows = sqlx::query_as::<_, MovieRow>(
            "SELECT movie_id, title, image_url, movie_url FROM movie \
             ORDER BY movie_id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list movies")?;
        Ok(rows)
    }

    /// Exact-tuple lookup used by deletion. When duplicates exist the oldest
    /// row wins, making "first match" deterministic.
    pub async fn find_first_by_fields(
        pool: &SqlitePool,
        title: &str,
        image_url: &str,
        movie_url: &str,
    ) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT movie_id FROM movie \
             WHERE title = $1 AND image_url = $2 AND movie_url = $3 \
             ORDER BY movie_id LIMIT 1",
        )
        .bind(title)
        .bind(image_url)
        .bind(movie_url)
        .fetch_optional(pool)
        .await
        .context("Failed to find movie")?;
        Ok(row.map(|(id,)| id))
    }

    pub async fn delete_by_id(pool: &SqlitePool, movie_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM movie WHERE movie_id = $1")
            .bind(movie_id)
            .execute(pool)
            .await
            .context("Failed to delete movie")?;
        Ok(())
    }
}
