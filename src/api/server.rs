// HTTP Server Lifecycle
// bind, serve the router, shut down on signal

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::app_router;
use crate::services::analyzer::SpeechAnalyzer;

/// Serve until `shutdown` resolves.
pub async fn serve<F>(analyzer: Arc<SpeechAnalyzer>, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(%local, "server.listening");

    axum::serve(listener, app_router(analyzer))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("server.stopped");
    Ok(())
}

/// Handle to a server running in a background task.
pub struct RunningServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RunningServer {
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}

/// Start a server on `addr` (port 0 picks a free one) and return without waiting.
pub async fn start_server_on(analyzer: Arc<SpeechAnalyzer>, addr: SocketAddr) -> Result<RunningServer, String> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind server: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = app_router(analyzer);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };
        tracing::info!(%addr, "server.started");
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await {
            tracing::error!("server error: {e}");
        }
        tracing::info!(%addr, "server.stopped");
    });

    Ok(RunningServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
