// src/bin/api_server.rs

use recipe_api::infra::config;
use recipe_api::transport;
use recipe_api::{AppConfig, MemoryStore, PgStore, Store};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin api_server -- [--memory]\n\
         \n\
         --memory   keep all data in process memory instead of PostgreSQL\n\
         \n\
         Env vars:\n\
           DATABASE_URL (required without --memory), DATABASE_MAX_CONNECTIONS,\n\
           BIND_ADDR, MEDIA_ROOT, MEDIA_URL, RUST_LOG\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let in_memory = args.iter().any(|a| a == "--memory");

    // --- Store ---
    let store: Arc<dyn Store> = if in_memory {
        warn!("Using the in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        info!("Connecting to PostgreSQL...");
        let store =
            PgStore::connect(&config::database_url(), config::database_max_connections()).await?;
        Arc::new(store)
    };

    // --- Application state ---
    let app_config = AppConfig::from_env();
    tokio::fs::create_dir_all(&app_config.media_root).await?;
    info!(
        media_root = %app_config.media_root.display(),
        media_url = %app_config.media_url,
        "Media storage ready"
    );
    let app_state = transport::http::AppState::new(store, app_config);

    // --- API server ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()),
        )
        .layer(cors);

    let bind_addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("API server listening on http://{}", bind_addr);
    info!("Swagger UI available at http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Graceful shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
