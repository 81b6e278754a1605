use cross_stitch_tracker::{api, config::Config, db::init_db, init_tracing, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    init_tracing();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let addr = SocketAddr::new(config.bind_addr, config.port);
    let debug_mode = config.debug;

    let state = match api::AppState::new(repo, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load templates: {}", e);
            std::process::exit(1);
        }
    };

    match state.sessions.purge_expired().await {
        Ok(purged) => tracing::info!(purged, "Expired sessions purged"),
        Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
    }

    // Create router
    let app = api::create_router(state);

    // Bind to address
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!(debug_mode, "Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
