//! Availability resolution.
//!
//! Turns `(today, marked dates)` into an [`AvailabilityStatus`]. Resolution
//! is a pure function: no clock reads, no I/O.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::date::DateKey;

/// Default number of upcoming dates reported by a status query.
pub const DEFAULT_HORIZON: usize = 5;

/// What membership in the stored date set means.
///
/// Stored dates are "marked" days. Whether a marked day is a day off or a
/// day on duty depends on the deployment, so the meaning is configured
/// rather than inferred from table or field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Marked days are days the subject is unavailable.
    #[default]
    Unavailable,
    /// Marked days are the only days the subject is available.
    Free,
}

impl Polarity {
    /// Availability of a day given whether it is marked.
    pub const fn is_available(self, marked: bool) -> bool {
        match self {
            Self::Unavailable => !marked,
            Self::Free => marked,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Free => "free",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unavailable" => Ok(Self::Unavailable),
            "free" => Ok(Self::Free),
            other => Err(format!("unknown polarity: {other}")),
        }
    }
}

/// Derived availability for a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityStatus {
    pub is_available_today: bool,
    pub today: DateKey,
    /// Marked dates on or after `today`, ascending, distinct, at most
    /// `horizon` long.
    pub upcoming: Vec<DateKey>,
    /// First day after `today` whose availability differs from today's.
    /// Not bounded by the horizon.
    pub next_change: Option<DateKey>,
}

impl AvailabilityStatus {
    /// The date the public countdown runs to.
    pub const fn countdown_target(&self) -> Option<DateKey> {
        self.next_change
    }
}

/// Resolver configured with a [`Polarity`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolver {
    polarity: Polarity,
}

impl Resolver {
    pub const fn new(polarity: Polarity) -> Self {
        Self { polarity }
    }

    pub const fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Computes the status for `today` from the marked dates.
    ///
    /// Duplicates in `marked` are collapsed before ordering.
    pub fn resolve(&self, today: DateKey, marked: &[DateKey], horizon: usize) -> AvailabilityStatus {
        let distinct: BTreeSet<DateKey> = marked.iter().copied().collect();
        let is_available_today = self.polarity.is_available(distinct.contains(&today));
        let upcoming = distinct.range(today..).copied().take(horizon).collect();

        AvailabilityStatus {
            is_available_today,
            today,
            upcoming,
            next_change: next_change(today, &distinct),
        }
    }
}

/// Availability flips on the first day after `today` whose membership
/// differs from today's.
fn next_change(today: DateKey, marked: &BTreeSet<DateKey>) -> Option<DateKey> {
    let mut day = today.next_day()?;
    if !marked.contains(&today) {
        return marked.range(day..).next().copied();
    }
    // End of the marked run containing today.
    while marked.contains(&day) {
        day = day.next_day()?;
    }
    Some(day)
}

/// Resolves with [`Polarity::Unavailable`]: stored dates are unavailable days.
pub fn resolve(today: DateKey, unavailable: &[DateKey], horizon: usize) -> AvailabilityStatus {
    Resolver::new(Polarity::Unavailable).resolve(today, unavailable, horizon)
}

/// First upcoming marked date, if any falls within the horizon.
pub fn next_transition_date(status: &AvailabilityStatus) -> Option<DateKey> {
    status.upcoming.first().copied()
}
