use crate::state::AppState;
use crate::web::api::middleware::{require_permission, AuthUser};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use reelbase_db::MovieRepo;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct MovieRequest {
    pub title: String,
    pub image_url: String,
    pub movie_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ListMoviesQuery {
    pub page: Option<i64>,
}

/// Clamp a 1-based page number to the valid range for the given total.
/// An empty store still has one (empty) page.
fn clamp_page(requested: i64, total: i64) -> i64 {
    let last = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    requested.clamp(1, last)
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
        .into_response()
}

/// POST /api/movies
#[tracing::instrument(skip(state, user, req), fields(title = %req.title))]
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<MovieRequest>,
) -> impl IntoResponse {
    if let Err(resp) = require_permission(&user.0, "add_movie") {
        return resp;
    }

    let movie = match MovieRepo::insert(&state.pool, &req.title, &req.image_url, &req.movie_url)
        .await
    {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("DB error creating movie: {:#}", e);
            return internal_error();
        }
    };

    Json(json!({
        "message": "Movie created",
        "movie": {
            "title": movie.title,
            "image_url": movie.image_url,
            "movie_url": movie.movie_url,
        },
    }))
    .into_response()
}

/// GET /api/movies?page=N
#[tracing::instrument(skip(state, user, query))]
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListMoviesQuery>,
) -> impl IntoResponse {
    if let Err(resp) = require_permission(&user.0, "view_movie") {
        return resp;
    }

    let total = match MovieRepo::count(&state.pool).await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("DB error counting movies: {:#}", e);
            return internal_error();
        }
    };

    let page = clamp_page(query.page.unwrap_or(1), total);
    let rows = match MovieRepo::list_page(&state.pool, PAGE_SIZE, (page - 1) * PAGE_SIZE).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("DB error listing movies: {:#}", e);
            return internal_error();
        }
    };

    let movies: Vec<serde_json::Value> = rows
        .iter()
        .map(|m| {
            json!({
                "title": m.title,
                "image_url": m.image_url,
                "movie_url": m.movie_url,
            })
        })
        .collect();

    Json(movies).into_response()
}

/// DELETE /api/movies
#[tracing::instrument(skip(state, user, req), fields(title = %req.title))]
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<MovieRequest>,
) -> impl IntoResponse {
    if let Err(resp) = require_permission(&user.0, "delete_movie") {
        return resp;
    }

    let movie_id = match MovieRepo::find_first_by_fields(
        &state.pool,
        &req.title,
        &req.image_url,
        &req.movie_url,
    )
    .await
    {
        Ok(Some(id)) => id,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Movie not found"})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("DB error finding movie: {:#}", e);
            return internal_error();
        }
    };

    if let Err(e) = MovieRepo::delete_by_id(&state.pool, movie_id).await {
        tracing::error!("DB error deleting movie: {:#}", e);
        return internal_error();
    }

    Json(json!({"message": "Movie deleted"})).into_response()
}
