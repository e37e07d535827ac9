//! Validation and application of advisor suggestions.
//!
//! Advisor output is untrusted text. Every suggested date goes through the
//! same strict parser as any other input, and the result is only ever
//! presented for confirmation. Suggested dates are free days, so what
//! applying them does to the stored set depends on the [`Polarity`].

use std::collections::BTreeSet;

use serde::Serialize;

use crate::date::{DateKey, parse_many};
use crate::resolver::Polarity;
use crate::store::{AvailabilityStore, StoreError};

/// Suggestions after validation against the current set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestionReview {
    /// Valid, distinct, ascending dates that are not free yet.
    pub dates: Vec<DateKey>,
    /// Valid dates that are already free.
    pub already_free: Vec<DateKey>,
    /// Valid dates before `today`.
    pub past: Vec<DateKey>,
    /// Raw entries that failed to parse.
    pub rejected: Vec<String>,
    pub reasoning: Option<String>,
}

impl SuggestionReview {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Sorts raw advisor output into actionable and non-actionable dates.
pub fn review(
    raw: &[String],
    reasoning: Option<String>,
    today: DateKey,
    marked: &[DateKey],
    polarity: Polarity,
) -> SuggestionReview {
    let (valid, rejected) = parse_many(raw);
    let marked: BTreeSet<DateKey> = marked.iter().copied().collect();
    let distinct: BTreeSet<DateKey> = valid.into_iter().collect();

    let mut review = SuggestionReview {
        rejected,
        reasoning: reasoning
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()),
        ..SuggestionReview::default()
    };
    for date in distinct {
        if date < today {
            review.past.push(date);
        } else if polarity.is_available(marked.contains(&date)) {
            review.already_free.push(date);
        } else {
            review.dates.push(date);
        }
    }
    review
}

/// Makes the confirmed `dates` free days.
///
/// Unmarks them when marked days are unavailable, marks them when marked
/// days are free. Returns how many stored dates changed.
pub fn apply_free_days(
    store: &dyn AvailabilityStore,
    polarity: Polarity,
    dates: &[DateKey],
) -> Result<usize, StoreError> {
    match polarity {
        Polarity::Unavailable => store.remove(dates),
        Polarity::Free => store.add(dates),
    }
}

/// Renders the current set the way the advisor prompt expects it.
pub fn describe_marked(marked: &[DateKey], polarity: Polarity) -> String {
    let (listed, missing) = match polarity {
        Polarity::Unavailable => ("unavailable days", "unavailability"),
        Polarity::Free => ("free days", "free day"),
    };
    if marked.is_empty() {
        return format!("No past {missing} data provided.");
    }
    let rendered = marked
        .iter()
        .map(|date| date.to_iso())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Current {listed}: {rendered}")
}
