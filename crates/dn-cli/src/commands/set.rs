//! Set command for replacing the stored dates.

use std::io::Write;

use anyhow::{Context, Result, bail};

use dn_core::{AvailabilityStore, date::parse_many};

pub fn run<W: Write>(
    writer: &mut W,
    store: &dyn AvailabilityStore,
    dates: &[String],
    clear: bool,
) -> Result<()> {
    let (mut accepted, rejected) = parse_many(dates);
    for raw in &rejected {
        writeln!(writer, "Skipped invalid date: {raw}")?;
    }
    // Refuse to wipe the set because every argument was malformed.
    if !clear && accepted.is_empty() {
        bail!("no valid dates given; use --clear to remove every date");
    }

    accepted.sort_unstable();
    accepted.dedup();
    store
        .replace_all(&accepted)
        .context("failed to save availability")?;
    tracing::info!(count = accepted.len(), "availability saved");

    if accepted.is_empty() {
        writeln!(writer, "Cleared all dates.")?;
    } else {
        writeln!(writer, "Stored {} date(s):", accepted.len())?;
        for date in &accepted {
            writeln!(writer, "- {date}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use dn_core::{DateKey, MemoryStore};

    fn key(s: &str) -> DateKey {
        DateKey::parse_iso(s).unwrap()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn set_replaces_and_reports_skipped() {
        let store = MemoryStore::with_dates([key("2025-01-01")]);
        let mut output = Vec::new();
        run(
            &mut output,
            &store,
            &args(&["2025-06-15", "june 10", "2025-06-10", "2025-06-15"]),
            false,
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Skipped invalid date: june 10\nStored 2 date(s):\n- 2025-06-10\n- 2025-06-15\n"
        );
        assert_eq!(
            store.list_unavailable().unwrap(),
            vec![key("2025-06-10"), key("2025-06-15")]
        );
    }

    #[test]
    fn set_refuses_when_every_date_is_invalid() {
        let store = MemoryStore::with_dates([key("2025-01-01")]);
        let mut output = Vec::new();
        let err = run(&mut output, &store, &args(&["2025-13-01"]), false).unwrap_err();

        assert!(err.to_string().contains("no valid dates"));
        assert_eq!(store.list_unavailable().unwrap(), vec![key("2025-01-01")]);
    }

    #[test]
    fn set_clear_empties_the_store() {
        let store = MemoryStore::with_dates([key("2025-01-01")]);
        let mut output = Vec::new();
        run(&mut output, &store, &[], true).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "Cleared all dates.\n");
        assert!(store.list_unavailable().unwrap().is_empty());
    }
}
