//! Serve command running the web surface.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use dn_core::{AvailabilityStore, Resolver, SystemClock};
use dn_web::{Advisor, AppState};

use crate::Config;

/// Builds the shared web state from configuration.
///
/// Suggestions are enabled only when an API key is available.
pub fn app_state(config: &Config, store: Arc<dyn AvailabilityStore>) -> Result<AppState> {
    let advisor = match config.resolved_api_key() {
        Some(key) => Some(Advisor {
            client: dn_llm::Client::new(key).context("failed to create advisor client")?,
            model: config.model.clone(),
            count: config.suggestions,
        }),
        None => {
            tracing::info!("no API key configured, suggestions disabled");
            None
        }
    };

    Ok(AppState::new(
        store,
        Arc::new(SystemClock),
        Resolver::new(config.polarity),
        config.horizon,
    )
    .with_advisor(advisor))
}

pub async fn run(state: AppState, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    dn_web::serve(listener, state).await.context("server error")
}
