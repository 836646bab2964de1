//! Barter Backend Service
//!
//! Main entry point for the barter marketplace backend.
//! This service provides:
//! - REST API for listings, barter requests, tracking, sessions and polls
//! - WebSocket chat server keyed by barter request
//! - Background purge of expired bearer tokens

use barter_backend::config::{AppConfig, LogFormat};
use barter_backend::database::{create_pool, run_migrations};
use barter_backend::error::{AppError, AppResult};
use barter_backend::{http, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    // Initialize tracing/logging with config
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "barter_backend={},sqlx=warn,tower_http=info",
            config.log_level
        )
        .into()
    });
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Barter Backend Service Starting                ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    if config.is_production() && config.log_format == LogFormat::Pretty {
        warn!("Pretty logs in production; set LOG_FORMAT=json for log shipping");
    }
    info!("Log level: {}", config.log_level);
    info!("HTTP port: {}", config.http_port);
    if let Some(chat_port) = config.chat_port {
        info!("Chat port: {}", chat_port);
    }

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool, None).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    let http_port = config.http_port;
    let chat_port = config.chat_port;
    let environment = config.environment.clone();

    let app_state = Arc::new(AppState::new(pool, config).map_err(|e| {
        error!("Failed to initialize application state: {}", e);
        e
    })?);
    info!("✓ Application state initialized");
    info!("✓ Audit trail writing to {:?}", app_state.audit.path());

    // =========================================================================
    // BACKGROUND TASKS
    // =========================================================================
    let purge_state = app_state.clone();
    let purge_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = purge_state.auth_service.purge_expired_tokens().await {
                warn!("Token purge failed: {}", e);
            }
        }
    });
    info!("✓ Token purge task started (hourly)");

    // =========================================================================
    // START SERVERS
    // =========================================================================
    let http_addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let http_listener = TcpListener::bind(http_addr)
        .await
        .map_err(|e| AppError::Message(format!("Failed to bind HTTP server: {}", e)))?;

    let router = http::router(app_state.clone());
    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, router).await {
            error!("HTTP server error: {}", e);
        }
    });
    info!("✓ HTTP server started on {}", http_addr);

    let chat_handle = if let Some(chat_port) = chat_port {
        let chat_addr = SocketAddr::from(([0, 0, 0, 0], chat_port));
        let listener = TcpListener::bind(chat_addr)
            .await
            .map_err(|e| AppError::Message(format!("Failed to bind chat server: {}", e)))?;

        let chat_server = app_state.chat_server();
        let handle = tokio::spawn(async move {
            chat_server.serve(listener).await;
        });

        info!("✓ Chat server started on {}", chat_addr);
        Some(handle)
    } else {
        warn!("CHAT_PORT not configured - chat server not started");
        None
    };

    // =========================================================================
    // READY
    // =========================================================================
    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Barter Backend Service Ready!                  ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  REST API:     0.0.0.0:{}                              ║", http_port);
    if let Some(chat_port) = chat_port {
        info!("║  Chat:         0.0.0.0:{}                              ║", chat_port);
    }
    info!("║  Environment:  {}                                    ║", environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = http_handle => {
            error!("HTTP server exited unexpectedly");
        }
        _ = purge_handle => {
            error!("Token purge task exited unexpectedly");
        }
        _ = async {
            if let Some(handle) = chat_handle {
                handle.await.ok();
            } else {
                // Never completes if chat is not running
                futures::future::pending::<()>().await;
            }
        } => {
            error!("Chat server exited unexpectedly");
        }
    }

    info!("Barter backend service shutdown complete");
    Ok(())
}
