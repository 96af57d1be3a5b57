// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ConvertDMC: image, TIFF, PDF and ZIP conversions over a small web form.
//
// Entry point. Initialises logging, loads configuration, and serves the upload
// page until Ctrl-C or SIGTERM.

mod config;
mod error;
mod page;
mod routes;
mod state;

use tokio::net::TcpListener;
use tokio::signal;

use config::WebConfig;
use error::WebError;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), WebError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = WebConfig::load()?;
    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        max_upload_bytes = config.max_upload_bytes,
        raster_dpi = config.engine.raster_dpi,
        "ConvertDMC starting"
    );

    let app = routes::router(AppState::new(config));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| WebError::Bind { addr, source })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("ConvertDMC stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown requested");
}
