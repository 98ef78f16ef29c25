//! WaveGuard Hazard Risk Platform - API Server
//!
//! Serves tsunami, flood and cyclone risk assessments over HTTP and, when
//! enabled, runs the scheduled hazard monitor in the same process.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use waveguard::services::SystemClock;
use waveguard::{create_app, init_tracing, shutdown_signal, Config, Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    init_tracing(&config.log_format);
    config.validate()?;

    tracing::info!("Starting WaveGuard Server");
    tracing::info!("Environment: {}", config.environment);

    let services = Services::from_config(&config).await?;
    let config = Arc::new(config);

    let cancel = CancellationToken::new();
    let monitor = if config.monitor.enabled && !config.monitor.locations.is_empty() {
        let monitor = Arc::new(services.monitor(&config, Arc::new(SystemClock)));
        Some(tokio::spawn(monitor.run(cancel.clone())))
    } else {
        tracing::info!("Scheduled monitor disabled");
        None
    };

    // Build application
    let app = create_app(services.app_state(Arc::clone(&config)));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    if let Some(handle) = monitor {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Monitor task failed");
        }
    }

    if let Some(db) = services.db {
        db.close().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}
