pub mod auctioneer;
pub mod bid_responder;
pub mod middleware;

use anyhow::{Context, Result};
use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tracing::info;

/// Service execution control instance
///
/// Lets anything holding a clone (e.g. a signal handler) ask the
/// http server to stop accepting connections and drain.
#[derive(Clone)]
pub struct ServiceControl {
    stop_all: Arc<watch::Sender<bool>>,
}

impl ServiceControl {
    pub fn new() -> Self {
        let (stop_all, _) = watch::channel(false);
        Self {
            stop_all: Arc::new(stop_all),
        }
    }

    pub fn stop_all(&self) {
        self.stop_all.send_replace(true);
    }

    /// Resolves once `stop_all` was called
    pub async fn stopped(&self) {
        let mut rx = self.stop_all.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ServiceControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve `app` on `addr` until `svc_ctl` is stopped
pub async fn run_http_server(app: Router, addr: SocketAddr, svc_ctl: ServiceControl) -> Result<()> {
    let server = axum::Server::try_bind(&addr)
        .with_context(|| format!("Failed to bind {addr}"))?
        .serve(app.into_make_service());
    info!(addr = %server.local_addr(), "listening");

    server
        .with_graceful_shutdown(async move { svc_ctl.stopped().await })
        .await
        .context("Failed to run http server")?;

    info!("http server stopped");
    Ok(())
}
