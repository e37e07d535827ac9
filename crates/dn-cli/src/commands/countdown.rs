//! Countdown command printing the time left until the next status change.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use dn_core::{
    AvailabilityStore, Clock, CountdownEngine, CountdownEvent, DEFAULT_HORIZON, Resolver,
    format_remaining, load_status, remaining_secs,
};

/// Prints the countdown until it is reached or `shutdown` completes.
///
/// With `once`, prints a single line and returns.
pub async fn run<W, S>(
    writer: &mut W,
    store: &dyn AvailabilityStore,
    clock: Arc<dyn Clock>,
    resolver: Resolver,
    once: bool,
    shutdown: S,
) -> Result<()>
where
    W: Write,
    S: Future<Output = ()>,
{
    let report = load_status(store, resolver, clock.today(), DEFAULT_HORIZON);
    if let Some(warning) = &report.warning {
        writeln!(writer, "Warning: {warning}")?;
    }
    let target = report.status.countdown_target();
    let Some(target) = target else {
        writeln!(writer, "No upcoming change.")?;
        return Ok(());
    };

    writeln!(writer, "Counting down to {}", target.long_display())?;
    if once {
        let remaining = remaining_secs(&*clock, target).max(0).unsigned_abs();
        writeln!(writer, "{}", format_remaining(remaining))?;
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut engine = CountdownEngine::new(clock);
    engine.start(target, move |event| {
        let _ = tx.send(event);
    });

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(CountdownEvent::Tick { display, .. }) => writeln!(writer, "{display}")?,
                Some(CountdownEvent::Reached) => {
                    writeln!(writer, "The time has come!")?;
                    break;
                }
                None => break,
            },
            () = &mut shutdown => {
                engine.stop();
                tracing::debug!("countdown interrupted");
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Utc};
    use dn_core::{AnchoredClock, DateKey, MemoryStore};

    fn key(s: &str) -> DateKey {
        DateKey::parse_iso(s).unwrap()
    }

    fn clock_at(rfc3339: &str) -> Arc<dyn Clock> {
        let anchor = DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc);
        Arc::new(AnchoredClock::new(anchor))
    }

    async fn render(store: &MemoryStore, now: &str, once: bool) -> String {
        let mut output = Vec::new();
        run(
            &mut output,
            store,
            clock_at(now),
            Resolver::default(),
            once,
            std::future::pending(),
        )
        .await
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_until_reached() {
        let store = MemoryStore::with_dates([key("2025-06-15")]);
        let output = render(&store, "2025-06-14T23:59:57Z", false).await;
        assert_eq!(
            output,
            "Counting down to Sunday, June 15, 2025\n3s\n2s\n1s\nThe time has come!\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_to_end_of_marked_run() {
        let store = MemoryStore::with_dates([key("2025-06-14"), key("2025-06-15"), key("2025-06-20")]);
        let output = render(&store, "2025-06-14T12:00:00Z", true).await;
        assert_eq!(
            output,
            "Counting down to Monday, June 16, 2025\n1d 12h 0m 0s\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_without_target() {
        let store = MemoryStore::with_dates([key("2025-06-01")]);
        let output = render(&store, "2025-06-14T12:00:00Z", false).await;
        assert_eq!(output, "No upcoming change.\n");
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_stops_on_shutdown() {
        let store = MemoryStore::with_dates([key("2025-06-20")]);
        let mut output = Vec::new();
        let shutdown = async {
            tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        };
        run(
            &mut output,
            &store,
            clock_at("2025-06-19T23:00:00Z"),
            Resolver::default(),
            false,
            shutdown,
        )
        .await
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "Counting down to Friday, June 20, 2025\n1h 0m 0s\n59m 59s\n59m 58s\n"
        );
    }
}
