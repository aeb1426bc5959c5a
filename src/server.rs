//! Local static file server for the exported demo page.

use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;

use crate::error::ForecastError;
use crate::export::DEMO_HTML;
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

pub fn router(root: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
}

/// Serve `root` on an already-bound listener until `shutdown` is cancelled.
pub async fn serve_until(listener: TcpListener, root: PathBuf, shutdown: CancellationToken) -> Result<()> {
    let app = router(&root);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("static file server failed")
}

/// Serve `root` on `localhost:port`, optionally open the demo page, and run
/// until Ctrl-C.
pub async fn serve(root: PathBuf, port: u16, open_browser: bool) -> Result<()> {
    if !root.is_dir() {
        return Err(ForecastError::missing("site directory", root).into());
    }

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let url = format!("http://localhost:{port}/{DEMO_HTML}");
    log_info!("Serving {} on http://localhost:{}/", root.display(), port);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log_info!("Shutting down server"),
            Err(err) => log_warn!("Failed to listen for Ctrl-C: {}", err),
        }
        signal_token.cancel();
    });

    if open_browser {
        if let Err(err) = open::that(&url) {
            log_warn!("Could not open a browser: {}", err);
            println!("Open your browser and navigate to {url}");
        }
    } else {
        println!("Open your browser and navigate to {url}");
    }

    serve_until(listener, root, shutdown).await
}

/// Blocking entry point for the CLI. The server is the only part of the
/// pipeline that needs a runtime, so it gets its own.
pub fn serve_blocking(root: PathBuf, port: u16, open_browser: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(serve(root, port, open_browser))
}
