//! Month grids for the admin date picker.

use std::collections::BTreeSet;

use dn_core::DateKey;

/// One cell of a month grid. Blank cells pad the first and last week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub blank: bool,
    pub iso: String,
    pub day: u32,
    pub checked: bool,
    pub is_today: bool,
}

impl DayCell {
    fn blank() -> Self {
        Self {
            blank: true,
            iso: String::new(),
            day: 0,
            checked: false,
            is_today: false,
        }
    }
}

/// A Monday-first month of [`DayCell`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub title: String,
    pub weeks: Vec<Vec<DayCell>>,
}

/// Builds `count` consecutive month grids starting with the month of `today`.
///
/// Returns the grids and the marked dates that fall outside them, so a form
/// can carry those through unchanged.
pub fn month_grids(
    today: DateKey,
    marked: &BTreeSet<DateKey>,
    count: usize,
) -> (Vec<MonthGrid>, Vec<DateKey>) {
    let mut grids = Vec::with_capacity(count);
    let mut shown = BTreeSet::new();
    let (mut year, mut month) = (today.year(), today.month());

    for _ in 0..count {
        let Ok(first) = DateKey::from_ymd(year, month, 1) else {
            break;
        };
        grids.push(month_grid(first, today, marked, &mut shown));
        (year, month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
    }

    let outside = marked.difference(&shown).copied().collect();
    (grids, outside)
}

fn month_grid(
    first: DateKey,
    today: DateKey,
    marked: &BTreeSet<DateKey>,
    shown: &mut BTreeSet<DateKey>,
) -> MonthGrid {
    let mut weeks = Vec::new();
    let mut week: Vec<DayCell> = (0..first.weekday_from_monday())
        .map(|_| DayCell::blank())
        .collect();

    let mut day = Some(first);
    while let Some(date) = day.filter(|d| d.month() == first.month()) {
        let checked = marked.contains(&date);
        if checked {
            shown.insert(date);
        }
        week.push(DayCell {
            blank: false,
            iso: date.to_iso(),
            day: date.day(),
            checked,
            is_today: date == today,
        });
        if week.len() == 7 {
            weeks.push(std::mem::take(&mut week));
        }
        day = date.next_day();
    }

    if !week.is_empty() {
        week.resize_with(7, DayCell::blank);
        weeks.push(week);
    }

    MonthGrid {
        title: first.as_naive().format("%B %Y").to_string(),
        weeks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DateKey {
        DateKey::parse_iso(s).unwrap()
    }

    #[test]
    fn june_2025_starts_on_sunday() {
        let marked = BTreeSet::from([key("2025-06-10")]);
        let (grids, outside) = month_grids(key("2025-06-09"), &marked, 1);
        let june = &grids[0];

        assert_eq!(june.title, "June 2025");
        assert_eq!(june.weeks.len(), 6);
        assert!(june.weeks.iter().all(|week| week.len() == 7));
        assert_eq!(june.weeks[0].iter().filter(|cell| cell.blank).count(), 6);
        assert_eq!(june.weeks[0][6].iso, "2025-06-01");

        let tenth = &june.weeks[2][1];
        assert_eq!(tenth.day, 10);
        assert!(tenth.checked);
        let ninth = &june.weeks[2][0];
        assert!(ninth.is_today);
        assert!(!ninth.checked);
        assert!(outside.is_empty());
    }

    #[test]
    fn grids_roll_over_year_end() {
        let (grids, _) = month_grids(key("2025-11-20"), &BTreeSet::new(), 3);
        let titles: Vec<&str> = grids.iter().map(|grid| grid.title.as_str()).collect();
        assert_eq!(titles, vec!["November 2025", "December 2025", "January 2026"]);
    }

    #[test]
    fn dates_outside_grids_are_reported() {
        let marked = BTreeSet::from([key("2025-05-30"), key("2025-06-02"), key("2025-09-01")]);
        let (_, outside) = month_grids(key("2025-06-09"), &marked, 2);
        assert_eq!(outside, vec![key("2025-05-30"), key("2025-09-01")]);
    }
}
