use std::sync::Arc;

use dn_core::{AvailabilityStore, Clock, Resolver, StatusReport, load_status};

use crate::error::AppError;

/// Advisor client plus the knobs used when calling it.
#[derive(Debug, Clone)]
pub struct Advisor {
    pub client: dn_llm::Client,
    pub model: String,
    pub count: u32,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn AvailabilityStore>,
    clock: Arc<dyn Clock>,
    resolver: Resolver,
    horizon: usize,
    advisor: Option<Advisor>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        clock: Arc<dyn Clock>,
        resolver: Resolver,
        horizon: usize,
    ) -> Self {
        Self {
            store,
            clock,
            resolver,
            horizon,
            advisor: None,
        }
    }

    #[must_use]
    pub fn with_advisor(mut self, advisor: Option<Advisor>) -> Self {
        self.advisor = advisor;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub const fn resolver(&self) -> Resolver {
        self.resolver
    }

    pub const fn advisor(&self) -> Option<&Advisor> {
        self.advisor.as_ref()
    }

    /// Runs a store operation on the blocking pool.
    pub async fn with_store<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&dyn AvailabilityStore) -> T + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || op(store.as_ref())).await?)
    }

    /// Resolves today's status, degrading instead of failing on store errors.
    pub async fn status(&self) -> Result<StatusReport, AppError> {
        let resolver = self.resolver;
        let horizon = self.horizon;
        let today = self.clock.today();
        self.with_store(move |store| load_status(store, resolver, today, horizon))
            .await
    }
}
