use anyhow::{Context, Result};
use reelbase_db::{create_pool, run_migrations, PermissionRepo, RoleRepo, UserRepo};
use reelbase_server::auth::hash_password;
use reelbase_server::config::ServerConfig;
use reelbase_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Reelbase server");

    // Load configuration
    let config_path =
        std::env::var("REELBASE_CONFIG").unwrap_or_else(|_| "server-config.yaml".to_string());

    tracing::info!("Loading config from: {}", config_path);

    let config_content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path))?;

    let config: ServerConfig = serde_yml::from_str(&config_content)
        .with_context(|| format!("Failed to parse config file: {}", config_path))?;

    // Create database pool
    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.db.url)
        .await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    // Seed initial admin user if configured
    if let Some(initial_user) = &config.auth.initial_user {
        match UserRepo::get_by_username(&pool, &initial_user.username).await {
            Ok(Some(_)) => {
                tracing::info!(
                    "Initial user '{}' already exists, skipping seed",
                    initial_user.username
                );
            }
            Ok(None) => {
                let password_hash = hash_password(&initial_user.password)
                    .context("Failed to hash initial user password")?;
                let role_id = RoleRepo::get_or_create(&pool, "admin").await?;
                let mut permission_ids = Vec::new();
                for codename in ["add_movie", "view_movie", "delete_movie"] {
                    let id = PermissionRepo::get_by_codename(&pool, codename)
                        .await?
                        .with_context(|| format!("Seed permission missing: {}", codename))?;
                    permission_ids.push(id);
                }
                UserRepo::create_with_grants(
                    &pool,
                    &uuid::Uuid::new_v4().to_string(),
                    &initial_user.username,
                    &password_hash,
                    role_id,
                    &permission_ids,
                )
                .await
                .context("Failed to create initial user")?;
                tracing::info!("Created initial user: {}", initial_user.username);
            }
            Err(e) => {
                tracing::warn!("Failed to check for initial user: {}", e);
            }
        }
    }

    // Build router
    let listen = config.listen.clone();
    let app = reelbase_server::web::build_router(AppState::new(pool, config));

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind to {}", listen))?;

    tracing::info!("Server listening on {}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping...");
}
