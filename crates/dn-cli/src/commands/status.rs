//! Status command for showing today's availability.

use std::io::Write;

use anyhow::Result;

use dn_core::{AvailabilityStore, Clock, Resolver, format_remaining, load_status, remaining_secs};

pub fn run<W: Write>(
    writer: &mut W,
    store: &dyn AvailabilityStore,
    clock: &dyn Clock,
    resolver: Resolver,
    horizon: usize,
    json: bool,
) -> Result<()> {
    let report = load_status(store, resolver, clock.today(), horizon);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    let status = &report.status;
    writeln!(writer, "Today: {}", status.today.long_display())?;
    writeln!(
        writer,
        "Status: {}",
        if status.is_available_today {
            "Available"
        } else {
            "Unavailable"
        }
    )?;

    if let Some(target) = status.countdown_target() {
        let remaining = remaining_secs(clock, target).max(0).unsigned_abs();
        writeln!(
            writer,
            "Next change: {} (in {})",
            target.long_display(),
            format_remaining(remaining)
        )?;
    }

    if status.upcoming.is_empty() {
        writeln!(writer, "No upcoming {} days.", resolver.polarity())?;
    } else {
        writeln!(writer, "Upcoming {} days:", resolver.polarity())?;
        for date in &status.upcoming {
            writeln!(writer, "- {}", date.long_display())?;
        }
    }

    if let Some(warning) = &report.warning {
        writeln!(writer, "Warning: {warning}")?;
    }

    Ok(())
}
