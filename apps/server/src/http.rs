//! HTTP server for vidprompt.

use axum::Router;
use axum::routing::{get, post};
use tokio::signal;

use super::config::ServerConfig;
use super::handlers::{AppState, handle_generate, handle_healthy, handle_preflight};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/ai/generate",
            post(handle_generate).options(handle_preflight),
        )
        .route("/-/healthy", get(handle_healthy))
        .with_state(state)
}

pub struct VidpromptServer {
    state: AppState,
    config: ServerConfig,
}

impl VidpromptServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Self { state, config }
    }

    /// Run the HTTP server until SIGINT or SIGTERM.
    pub async fn run(self) -> std::io::Result<()> {
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        tracing::info!("Starting vidprompt HTTP server on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shut down gracefully");
        Ok(())
    }
}

/// Listen for SIGTERM and SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
