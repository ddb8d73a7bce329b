//! Server lifecycle: bind the register's HTTP listener, serve it in a
//! background task and hand back a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::register_router;
use crate::core_state::RegisterState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Failed to read server address: {0}")]
    LocalAddr(std::io::Error),
}

/// Handle to a running register server.
pub struct RegisterServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RegisterServer {
    /// Base URL for a browser on this machine.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Signal a graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Register server shutdown signal sent");
        }
    }

    /// Wait for the serve task to exit.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            tracing::error!("Register server task failed: {e}");
        }
    }
}

/// Bind `addr` (port 0 picks an ephemeral port) and start serving.
pub async fn start_server_on(
    core: Arc<RegisterState>,
    addr: SocketAddr,
) -> Result<RegisterServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = register_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Register server received shutdown signal");
        };

        tracing::info!(%addr, "Register server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Register server error: {e}");
        }

        tracing::info!("Register server stopped");
    });

    Ok(RegisterServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        handle,
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
