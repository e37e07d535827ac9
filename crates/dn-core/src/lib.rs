//! Core domain logic for the availability notifier.
//!
//! This crate contains:
//! - Calendar-day keys and strict ISO date parsing
//! - Availability resolution for a day against the marked date set
//! - The countdown engine driving the public "time until" display
//! - The store abstraction with an in-memory realization
//! - Validation of advisor suggestions

mod countdown;
pub mod date;
mod resolver;
pub mod status;
pub mod store;
pub mod suggest;

pub use countdown::{
    AnchoredClock, Clock, CountdownEngine, CountdownEvent, CountdownState, SystemClock,
    TICK_PERIOD, format_remaining, remaining_secs,
};
pub use date::{DateError, DateKey};
pub use resolver::{
    AvailabilityStatus, DEFAULT_HORIZON, Polarity, Resolver, next_transition_date, resolve,
};
pub use status::{StatusReport, load_status};
pub use store::{AvailabilityStore, MemoryStore, StoreError};
pub use suggest::{SuggestionReview, apply_free_days, review};
