pub mod auth;
pub mod middleware;
pub mod movies;

use crate::state::AppState;
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

pub fn build_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        // Movie routes
        .route(
            "/movies",
            get(movies::list_movies)
                .post(movies::create_movie)
                .delete(movies::delete_movie),
        )
        .with_state(state)
}
