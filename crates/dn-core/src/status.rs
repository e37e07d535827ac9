//! Status queries against a store.

use serde::Serialize;

use crate::date::DateKey;
use crate::resolver::{AvailabilityStatus, Resolver};
use crate::store::AvailabilityStore;

/// A resolved status plus any degradation notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: AvailabilityStatus,
    /// Set when the store could not be read and `status` is the fallback.
    pub warning: Option<String>,
}

impl StatusReport {
    pub const fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

/// Reads the store and resolves the status for `today`.
///
/// Store failures never propagate: the status falls back to the empty-set
/// resolution and the report carries a warning instead.
pub fn load_status(
    store: &dyn AvailabilityStore,
    resolver: Resolver,
    today: DateKey,
    horizon: usize,
) -> StatusReport {
    match store.list_unavailable() {
        Ok(dates) => StatusReport {
            status: resolver.resolve(today, &dates, horizon),
            warning: None,
        },
        Err(err) => {
            tracing::warn!(%err, "failed to read availability, using default status");
            StatusReport {
                status: resolver.resolve(today, &[], horizon),
                warning: Some(
                    "Could not read the availability store. Displaying default status."
                        .to_string(),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Polarity;
    use crate::store::{MemoryStore, StoreError};

    struct BrokenStore;

    impl AvailabilityStore for BrokenStore {
        fn list_unavailable(&self) -> Result<Vec<DateKey>, StoreError> {
            Err(StoreError::Unavailable("no such table: unavailable_dates".to_string()))
        }

        fn replace_all(&self, _dates: &[DateKey]) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("read-only".to_string()))
        }
    }

    fn key(s: &str) -> DateKey {
        DateKey::parse_iso(s).unwrap()
    }

    #[test]
    fn load_status_reads_store() {
        let store = MemoryStore::with_dates([key("2025-06-10"), key("2025-06-15")]);
        let report = load_status(&store, Resolver::default(), key("2025-06-10"), 5);
        assert!(!report.is_degraded());
        assert!(!report.status.is_available_today);
        assert_eq!(report.status.upcoming, vec![key("2025-06-10"), key("2025-06-15")]);
    }

    #[test]
    fn load_status_degrades_on_store_failure() {
        let report = load_status(&BrokenStore, Resolver::default(), key("2025-06-10"), 5);
        assert!(report.is_degraded());
        assert!(report.status.is_available_today);
        assert!(report.status.upcoming.is_empty());
        assert_eq!(report.status.today, key("2025-06-10"));
    }

    #[test]
    fn degraded_status_follows_polarity() {
        let report = load_status(
            &BrokenStore,
            Resolver::new(Polarity::Free),
            key("2025-06-10"),
            5,
        );
        assert!(report.is_degraded());
        assert!(!report.status.is_available_today);
    }
}
