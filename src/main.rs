use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use clinic_audit::config::{Config, ConnectionMode};
use clinic_audit::db::ConnectionProvider;
use clinic_audit::db::mysql::{DirectConnector, PooledConnector};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("Starting clinic audit service");

    let mut pool = None;
    let provider: Arc<dyn ConnectionProvider> = match config.database.mode {
        ConnectionMode::Direct => Arc::new(DirectConnector::new(&config.database)),
        ConnectionMode::Pooled => {
            let pooled = Arc::new(PooledConnector::new(&config.database));
            pool = Some(pooled.clone());
            pooled
        }
    };

    tracing::info!(
        host = %config.database.host,
        database = %config.database.database,
        mode = ?config.database.mode,
        table = %config.audit.table,
        "Audit store configured"
    );

    let writer = clinic_audit::build_writer(provider, &config.audit)?;

    let addr = SocketAddr::new(config.host, config.port);
    let app = clinic_audit::build_app(writer);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        pool.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
