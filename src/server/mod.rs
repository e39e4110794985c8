use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerEndpoint;

pub mod middleware;

/// In-flight requests get this long to drain after a termination signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The one piece of state shared across request handlers.
pub type ReadyFlag = Arc<AtomicBool>;

/// Route table: a fixed diagnostic endpoint, an optional readiness probe,
/// and a static-file catch-all rooted at the server root. Request-id and
/// access-log layers wrap everything, the probe and static files included.
pub fn build_router(root: &Path, ready: ReadyFlag, expose_health: bool) -> Router {
    let mut router = Router::new().route("/test", get(test_endpoint));
    if expose_health {
        router = router.route("/healthz", get(healthz));
    }

    router
        .fallback_service(ServeDir::new(root))
        .layer(from_fn(middleware::access_log))
        .layer(from_fn(middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(ready)
}

/// Serve `root` until an interrupt or termination signal arrives, then
/// drain within the grace period. A drain that outlives the grace period is
/// an error.
pub async fn serve(root: &Path, endpoint: ServerEndpoint, expose_health: bool) -> Result<()> {
    let ready: ReadyFlag = Arc::new(AtomicBool::new(false));
    let app = build_router(root, ready.clone(), expose_health);

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], endpoint.port));
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;

    info!(
        "Serving {} on http://{}",
        root.display(),
        endpoint.authority()
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await
    });

    ready.store(true, Ordering::SeqCst);

    shutdown_signal().await?;
    info!("Shutdown signal received, draining connections");
    ready.store(false, Ordering::SeqCst);
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(joined) => joined
            .context("Server task panicked")?
            .context("Server error")?,
        Err(_) => anyhow::bail!(
            "Requests still in flight after the {}s shutdown grace period",
            SHUTDOWN_GRACE.as_secs()
        ),
    }

    info!("Server stopped");
    Ok(())
}

async fn test_endpoint() -> &'static str {
    "Test endpoint"
}

/// Readiness probe: 204 while serving, 503 while starting or draining.
async fn healthz(State(ready): State<ReadyFlag>) -> StatusCode {
    if ready.load(Ordering::SeqCst) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Block until SIGINT or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for interrupt")?;
            }
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for interrupt")?;

    Ok(())
}
