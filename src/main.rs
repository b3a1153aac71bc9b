//! Spot Me - a state-managed HTTP server for running timed workout sessions
//!
//! This is the main entry point for the spot-me application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use spot_me::{
    api::create_router,
    config::Config,
    state::AppState,
    storage::JsonFileRepository,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("spot_me={},tower_http=info", config.log_level()))
        .init();

    info!("Starting spot-me server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, data_dir={:?}",
        config.host, config.port, config.data_dir
    );

    // Open the per-user data store; the engine and the handlers share it
    let repository = Arc::new(JsonFileRepository::new(&config.data_dir)?);

    // Create application state; this also spawns the session engine task
    let state = AppState::new(repository, config.port, config.host.clone());

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET/POST   /users/:id/templates          - List / author workouts");
    info!("  PUT/DELETE /users/:id/templates/:tid     - Edit / remove a workout");
    info!("  POST /users/:id/session/start            - Start a session");
    info!("  POST /users/:id/session/complete-set     - Log the current set");
    info!("  POST /users/:id/session/skip-rest        - Cut the rest short");
    info!("  POST /users/:id/session/pause-rest       - Pause the rest timer");
    info!("  POST /users/:id/session/resume-rest      - Resume the rest timer");
    info!("  GET/DELETE /users/:id/session            - Inspect / abandon session");
    info!("  GET  /users/:id/history                  - Finished sessions");
    info!("  GET  /users/:id/stats                    - Profile statistics");
    info!("  GET  /status                             - Server status");
    info!("  GET  /health                             - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
