pub mod domain;
pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;
pub mod usecases;

use tokio::net::TcpListener;

use crate::shared::config;
use crate::shared::data::db;
use crate::shared::format::format_number;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_file = system::tracing::initialize()?;
    tracing::info!("Logging to {}", log_file.display());

    let config = config::load_config()?;

    // Attachment store
    let db_path = config::get_database_path(&config);
    db::initialize_database(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;
    let conn = db::get_connection();
    match db::check_integrity(conn).await {
        Ok(true) => tracing::info!("Attachment database integrity: ok"),
        Ok(false) => tracing::warn!("Attachment database integrity check FAILED"),
        Err(e) => tracing::warn!("Attachment database integrity check error: {:#}", e),
    }
    match domain::a003_attachment::repository::total_count(conn).await {
        Ok(total) => tracing::info!("Stored attachments: {}", format_number(total as usize)),
        Err(e) => tracing::warn!("Cannot count attachments: {:#}", e),
    }

    // Sienge fetcher
    usecases::u501_fetch_from_sienge::initialize(&config)?;
    tracing::info!(
        "Sienge: contracts from {}, {} measurement endpoint candidates",
        config.sienge.contracts_url,
        config.sienge.measurement_urls.len()
    );

    let app = routes::configure_routes(&config.server);

    let addr = config.server_addr();
    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => {
            tracing::info!("Server listening on http://{}", addr);
            listener
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            return Err(anyhow::anyhow!("cannot bind {}: {}", addr, e));
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested, finishing in-flight requests"),
        Err(e) => {
            tracing::error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
