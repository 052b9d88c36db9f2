//! vesta-helper server
//!
//! Usage: vesta-helper [CONFIG.yaml]
//!
//! The config path may also be given in `VESTA_CONFIG`. Environment
//! variables override the file; see [`vesta_helper::config`].

use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use vesta_helper::api::{build_router, AppState};
use vesta_helper::{Error, Sayings, Settings, TransitClient, VestaboardClient};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("vesta-helper failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VESTA_CONFIG").ok())
        .map(PathBuf::from);
    let settings = Settings::load(config_path.as_deref())?;

    let board = VestaboardClient::from_settings(&settings.vestaboard)?;
    let sayings = Sayings::from_settings(&settings.sayings)?;

    let mut state = AppState::new(board, sayings);
    match TransitClient::from_settings(&settings.transit) {
        Ok(client) => state = state.with_transit(client),
        Err(e) => tracing::warn!("Transit lookups disabled: {}", e),
    }

    let app = build_router(state);

    let addr = settings.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Config(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("vesta-helper listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Request(format!("server error: {e}")))?;

    tracing::info!("vesta-helper stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
