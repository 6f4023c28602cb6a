mod handlers;
mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::Result;

/// Build the HTTP routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::feed))
        .route("/rss", get(handlers::feed))
        .route("/options", get(handlers::options))
        .route("/add", post(handlers::add_keyword))
        .route("/delete", post(handlers::delete_keyword))
        .route("/run-now", post(handlers::run_now))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .with_state(state)
}

/// Bind `addr` and serve until shutdown is signalled
pub async fn serve(state: AppState, addr: &str, shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    serve_listener(listener, state, shutdown).await
}

pub async fn serve_listener(
    listener: TcpListener,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // A dropped sender also stops the server
            let _ = shutdown.wait_for(|stop| *stop).await;
            tracing::info!("HTTP server shutting down");
        })
        .await?;

    Ok(())
}
