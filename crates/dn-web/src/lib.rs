//! HTTP surface for the availability notifier.
//!
//! Serves the public status page, the admin editor, a small JSON API and a
//! server-sent countdown stream.

mod api;
mod calendar;
mod error;
mod events;
mod pages;
mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::{AppError, ErrorResponse};
pub use state::{Advisor, AppState};

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(pages::router())
        .merge(api::router())
        .merge(events::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serves the application on an already-bound listener until shutdown.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "dn listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
