//! Storage abstraction for the marked date set.
//!
//! Two realizations exist: [`MemoryStore`] here, for tests and throwaway
//! deployments, and the SQLite store in `dn-db`. The caller picks one at
//! startup and passes it around explicitly.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::date::DateKey;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or queried.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for the set of marked dates.
///
/// Implementations are responsible for their own synchronization; the last
/// completed `replace_all` wins.
pub trait AvailabilityStore: Send + Sync {
    /// Lists every stored date in ascending order.
    fn list_unavailable(&self) -> Result<Vec<DateKey>, StoreError>;

    /// Replaces the whole set with `dates`. Duplicates are ignored.
    fn replace_all(&self, dates: &[DateKey]) -> Result<(), StoreError>;

    /// Merges `dates` into the stored set.
    ///
    /// Returns the number of dates that were not already stored.
    fn add(&self, dates: &[DateKey]) -> Result<usize, StoreError> {
        let mut merged: BTreeSet<DateKey> = self.list_unavailable()?.into_iter().collect();
        let before = merged.len();
        merged.extend(dates.iter().copied());
        let added = merged.len() - before;
        if added > 0 {
            let merged: Vec<DateKey> = merged.into_iter().collect();
            self.replace_all(&merged)?;
        }
        Ok(added)
    }

    /// Removes `dates` from the stored set.
    ///
    /// Returns the number of dates that were actually stored.
    fn remove(&self, dates: &[DateKey]) -> Result<usize, StoreError> {
        let mut remaining: BTreeSet<DateKey> = self.list_unavailable()?.into_iter().collect();
        let before = remaining.len();
        for date in dates {
            remaining.remove(date);
        }
        let removed = before - remaining.len();
        if removed > 0 {
            let remaining: Vec<DateKey> = remaining.into_iter().collect();
            self.replace_all(&remaining)?;
        }
        Ok(removed)
    }
}

/// Process-local store with no persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    dates: Mutex<BTreeSet<DateKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `dates`.
    pub fn with_dates(dates: impl IntoIterator<Item = DateKey>) -> Self {
        Self {
            dates: Mutex::new(dates.into_iter().collect()),
        }
    }
}

impl AvailabilityStore for MemoryStore {
    fn list_unavailable(&self) -> Result<Vec<DateKey>, StoreError> {
        let dates = self.dates.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(dates.iter().copied().collect())
    }

    fn replace_all(&self, dates: &[DateKey]) -> Result<(), StoreError> {
        let mut stored = self.dates.lock().unwrap_or_else(PoisonError::into_inner);
        *stored = dates.iter().copied().collect();
        Ok(())
    }
}
