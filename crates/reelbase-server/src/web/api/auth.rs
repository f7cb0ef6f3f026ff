use crate::auth::{
    create_token_pair, hash_password, validate_refresh_token, verify_password, TokenPair,
};
use crate::state::AppState;
use crate::web::api::middleware::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use reelbase_db::{PermissionRepo, RoleRepo, UserRepo};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Role names and effective permission codenames as stored right now,
/// for embedding into a fresh token pair.
async fn current_grants(pool: &SqlitePool, user_id: &str) -> anyhow::Result<(Vec<String>, Vec<String>)> {
    let roles = RoleRepo::list_names_for_user(pool, user_id).await?;
    let perms = PermissionRepo::list_codenames_for_user(pool, user_id).await?;
    Ok((roles, perms))
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
        .into_response()
}

/// POST /api/auth/register
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    match UserRepo::get_by_username(&state.pool, &req.username).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({"error": "Username already taken"})),
            )
                .into_response()
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("DB error during registration: {:#}", e);
            return internal_error();
        }
    }

    // Resolve every codename before writing anything, so a bad codename
    // leaves no partially-attached user behind.
    let mut permission_ids = Vec::with_capacity(req.permissions.len());
    for codename in &req.permissions {
        match PermissionRepo::get_by_codename(&state.pool, codename).await {
            Ok(Some(id)) => permission_ids.push(id),
            Ok(None) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": format!("Unknown permission: {}", codename)})),
                )
                    .into_response()
            }
            Err(e) => {
                tracing::error!("DB error resolving permission: {:#}", e);
                return internal_error();
            }
        }
    }

    let role_id = match RoleRepo::get_or_create(&state.pool, &req.role).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("DB error creating role: {:#}", e);
            return internal_error();
        }
    };

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Password hashing error: {:#}", e);
            return internal_error();
        }
    };

    let user_id = Uuid::new_v4().to_string();
    if let Err(e) = UserRepo::create_with_grants(
        &state.pool,
        &user_id,
        &req.username,
        &password_hash,
        role_id,
        &permission_ids,
    )
    .await
    {
        // A registration racing past the duplicate check above lands here
        if reelbase_db::is_unique_violation(&e) {
            return (
                StatusCode::CONFLICT,
                Json(json!({"error": "Username already taken"})),
            )
                .into_response();
        }
        tracing::error!("DB error creating user: {:#}", e);
        return internal_error();
    }

    let pair = match issue_tokens(&state, &user_id, &req.username).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    tracing::info!("Registered user '{}'", req.username);
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "access_token": pair.access_token,
            "refresh_token": pair.refresh_token,
        })),
    )
        .into_response()
}

/// POST /api/auth/login
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let invalid_credentials = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid username or password"})),
        )
            .into_response()
    };

    let user = match UserRepo::get_by_username(&state.pool, &req.username).await {
        Ok(Some(u)) => u,
        Ok(None) => return invalid_credentials(),
        Err(e) => {
            tracing::error!("DB error during login: {:#}", e);
            return internal_error();
        }
    };

    match verify_password(&req.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(),
        Err(e) => {
            tracing::error!("Password verification error: {:#}", e);
            return internal_error();
        }
    }

    // No side effects beyond token issuance
    let pair = match issue_tokens(&state, &user.user_id, &user.username).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    Json(pair).into_response()
}

/// POST /api/auth/refresh
#[tracing::instrument(skip(state, req))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> impl IntoResponse {
    let claims = match validate_refresh_token(&req.refresh_token, &state.config.auth.jwt_secret) {
        Ok(c) => c,
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid or expired refresh token"})),
            )
                .into_response()
        }
    };

    // Re-derive grants from the store so revoked permissions fall out of
    // circulation at the refresh boundary.
    let user = match UserRepo::get_by_id(&state.pool, &claims.sub).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "User no longer exists"})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("DB error during token refresh: {:#}", e);
            return internal_error();
        }
    };

    let pair = match issue_tokens(&state, &user.user_id, &user.username).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    Json(pair).into_response()
}

/// GET /api/auth/me
#[tracing::instrument(skip(user))]
pub async fn me(user: AuthUser) -> impl IntoResponse {
    let claims = user.0;
    Json(json!({
        "user_id": claims.sub,
        "username": claims.username,
        "roles": claims.roles,
        "permissions": claims.perms,
    }))
}

async fn issue_tokens(
    state: &AppState,
    user_id: &str,
    username: &str,
) -> Result<TokenPair, axum::response::Response> {
    let (roles, perms) = match current_grants(&state.pool, user_id).await {
        Ok(g) => g,
        Err(e) => {
            tracing::error!("DB error loading grants: {:#}", e);
            return Err(internal_error());
        }
    };

    create_token_pair(user_id, username, &roles, &perms, &state.config.auth).map_err(|e| {
        tracing::error!("Failed to create token pair: {:#}", e);
        internal_error()
    })
}
