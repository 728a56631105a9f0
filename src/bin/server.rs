// Tabelionato backend entry point

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tabelionato_backend::db;
use tabelionato_backend::process_lookup::ProcessLookupClient;
use tabelionato_backend::server::config::ServerConfig;
use tabelionato_backend::services::auth_service;
use tabelionato_backend::services::encryption_service::EncryptionService;
use tabelionato_backend::web::{self, AppState};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) -> WorkerGuard {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for the shutdown signal.");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Logging needs log_dir, so configuration errors before this point go to stderr.
    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    let _log_guard = init_logging(&server_config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Tabelionato backend.");

    // --- Database Setup ---
    let db_pool = db::connect(&server_config.database_url).await?;
    db::ensure_schema(&db_pool).await?;

    if let Err(e) = auth_service::bootstrap_admin(
        &db_pool,
        server_config.admin_username.as_deref(),
        server_config.admin_password.as_deref(),
    )
    .await
    {
        error!(error = %e, "Admin bootstrap failed.");
        return Err(e.into());
    }

    // --- Services ---
    let encryption_service = Arc::new(EncryptionService::from_hex_key(&server_config.settings_encryption_key)?);
    let lookup_client = Arc::new(ProcessLookupClient::new(server_config.lookup_timeout())?);
    info!(
        timeout_secs = server_config.lookup_timeout_secs,
        "Process lookup client ready."
    );

    let app_state = Arc::new(AppState {
        db_pool,
        config: server_config.clone(),
        encryption_service,
        lookup_client,
    });
    let app = web::create_axum_router(app_state);

    // --- HTTP Server ---
    let addr: SocketAddr = server_config.listen_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}
