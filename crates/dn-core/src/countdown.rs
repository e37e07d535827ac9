//! Countdown to the next status change.
//!
//! [`CountdownEngine`] owns at most one ticking task. Ticks are delivered to
//! a sink while holding the engine's state lock, and [`CountdownEngine::stop`]
//! bumps a generation counter under that same lock, so once `stop` returns
//! no stale tick can reach the sink.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::date::DateKey;

/// Nominal refresh period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Source of the current time and of day boundaries.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The instant the given day starts.
    fn midnight(&self, date: DateKey) -> DateTime<Utc>;

    /// The current calendar day.
    fn today(&self) -> DateKey;
}

/// Wall clock in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn midnight(&self, date: DateKey) -> DateTime<Utc> {
        local_midnight_to_utc(date)
    }

    fn today(&self) -> DateKey {
        DateKey::today()
    }
}

/// Converts local midnight of `date` to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_midnight_to_utc(date: DateKey) -> DateTime<Utc> {
    let midnight = date.as_naive().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            // Midnight can fall in a DST spring-forward gap; 1am always exists.
            let one_am = date.as_naive().and_hms_opt(1, 0, 0)?;
            Local.from_local_datetime(&one_am).earliest()
        })
        .map_or_else(
            || Utc.from_utc_datetime(&midnight),
            |local| local.with_timezone(&Utc),
        )
}

/// UTC clock that starts at a fixed instant and advances with the tokio
/// timer, so it follows paused and auto-advanced test time.
#[derive(Debug, Clone)]
pub struct AnchoredClock {
    anchor: DateTime<Utc>,
    started: Instant,
}

impl AnchoredClock {
    pub fn new(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor + elapsed
    }

    fn midnight(&self, date: DateKey) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.as_naive().and_time(NaiveTime::MIN))
    }

    fn today(&self) -> DateKey {
        DateKey::from(self.now().date_naive())
    }
}

/// Whole seconds from now until `target` starts, rounded up; zero or
/// negative once the day has begun.
pub fn remaining_secs(clock: &dyn Clock, target: DateKey) -> i64 {
    ceil_secs(clock.midnight(target) - clock.now())
}

/// Rounds a partial second up so the countdown never reaches zero early.
fn ceil_secs(delta: chrono::TimeDelta) -> i64 {
    let millis = delta.num_milliseconds();
    if millis > 0 {
        (millis + 999) / 1000
    } else {
        millis / 1000
    }
}

/// Formats a remaining duration, e.g. `1d 1h 1m 1s`.
///
/// Units start at the first non-zero one and run down to seconds, which
/// are always shown.
pub fn format_remaining(remaining_secs: u64) -> String {
    let days = remaining_secs / 86_400;
    let hours = (remaining_secs % 86_400) / 3_600;
    let minutes = (remaining_secs % 3_600) / 60;
    let seconds = remaining_secs % 60;

    let mut parts = Vec::with_capacity(4);
    let mut emitting = false;
    for (value, unit) in [(days, 'd'), (hours, 'h'), (minutes, 'm')] {
        emitting |= value > 0;
        if emitting {
            parts.push(format!("{value}{unit}"));
        }
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

/// Something the countdown reports to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownEvent {
    Tick { remaining_secs: u64, display: String },
    /// The target day has started. Sent once, after which ticking stops.
    Reached,
}

/// Lifecycle of a [`CountdownEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Running { target: DateKey },
    Expired { target: DateKey },
}

#[derive(Debug)]
struct Shared {
    generation: u64,
    state: CountdownState,
}

/// Periodic countdown towards the start of a day.
///
/// `start` must be called from within a tokio runtime. The sink runs while
/// the engine's lock is held and must not call back into the engine.
pub struct CountdownEngine {
    clock: Arc<dyn Clock>,
    period: Duration,
    shared: Arc<Mutex<Shared>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CountdownEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownEngine")
            .field("period", &self.period)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CountdownEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            period: TICK_PERIOD,
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                state: CountdownState::Idle,
            })),
            task: None,
        }
    }

    /// Overrides the tick period.
    #[must_use]
    pub const fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn state(&self) -> CountdownState {
        lock(&self.shared).state
    }

    /// Starts counting down to midnight of `target`, replacing any running
    /// countdown.
    ///
    /// The first tick is delivered immediately.
    pub fn start<F>(&mut self, target: DateKey, sink: F)
    where
        F: FnMut(CountdownEvent) + Send + 'static,
    {
        self.stop();

        let generation = {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            shared.state = CountdownState::Running { target };
            shared.generation
        };
        tracing::debug!(%target, generation, "countdown started");

        let ticker = Ticker {
            shared: Arc::clone(&self.shared),
            clock: Arc::clone(&self.clock),
            generation,
            target,
            target_instant: self.clock.midnight(target),
        };
        self.task = Some(tokio::spawn(ticker.run(self.period, sink)));
    }

    /// Stops ticking. Idempotent; no event is delivered after it returns.
    pub fn stop(&mut self) {
        {
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            shared.state = CountdownState::Idle;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CountdownEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Ticker {
    shared: Arc<Mutex<Shared>>,
    clock: Arc<dyn Clock>,
    generation: u64,
    target: DateKey,
    target_instant: DateTime<Utc>,
}

impl Ticker {
    async fn run<F>(self, period: Duration, mut sink: F)
    where
        F: FnMut(CountdownEvent) + Send + 'static,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if !self.deliver(&mut sink) {
                return;
            }
        }
    }

    /// Emits one event; returns `false` once ticking should end.
    fn deliver<F>(&self, sink: &mut F) -> bool
    where
        F: FnMut(CountdownEvent),
    {
        let remaining = ceil_secs(self.target_instant - self.clock.now());

        let mut shared = lock(&self.shared);
        if shared.generation != self.generation {
            return false;
        }
        if remaining <= 0 {
            shared.state = CountdownState::Expired {
                target: self.target,
            };
            sink(CountdownEvent::Reached);
            return false;
        }

        let remaining_secs = remaining.unsigned_abs();
        sink(CountdownEvent::Tick {
            remaining_secs,
            display: format_remaining(remaining_secs),
        });
        true
    }
}

fn lock(shared: &Mutex<Shared>) -> std::sync::MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
