//! Clock engine - timer and stopwatch with background ticking
//!
//! A [`ClockEngine`] moves `Idle -> Running -> Stopped` and can be started
//! again from `Stopped`. Each `start` spawns one ticker task; the ticker ends
//! on its own once it sees the engine is no longer running.

mod signal;

pub use signal::CompletionSignal;

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Largest value `HH:MM:SS` can show for a stopwatch (99:59:59)
pub const MAX_DISPLAY_SECONDS: u64 = 99 * 3600 + 59 * 60 + 59;

/// What the clock measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// Counts down a fixed length, then stops and signals
    Timer,
    /// Counts up until stopped
    Stopwatch,
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockPhase {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Saved clock state, e.g. for resuming a stopwatch later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub kind: ClockKind,
    pub phase: ClockPhase,
    pub elapsed_seconds: u64,
    pub remaining_seconds: u64,
}

#[derive(Debug, Default)]
struct ClockState {
    phase: ClockPhase,
    elapsed: u64,
    remaining: u64,
    /// Timer length, including any time added since `start`
    target: u64,
}

type SharedState = Arc<Mutex<ClockState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, ClockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A timer or stopwatch
pub struct ClockEngine {
    kind: ClockKind,
    state: SharedState,
    signal: Option<CompletionSignal>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ClockEngine {
    /// Create an idle clock. `signal` is fired when a timer completes.
    pub fn new(kind: ClockKind, signal: Option<CompletionSignal>) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(ClockState::default())),
            signal,
            ticker: Mutex::new(None),
        }
    }

    pub fn timer(signal: Option<CompletionSignal>) -> Self {
        Self::new(ClockKind::Timer, signal)
    }

    pub fn stopwatch() -> Self {
        Self::new(ClockKind::Stopwatch, None)
    }

    /// Start ticking. Must be called from within a Tokio runtime.
    ///
    /// For a timer, `period_seconds` is the length to count down, ticking once
    /// a second. For a stopwatch, it is the tick period, and each tick adds one
    /// to the elapsed count. A zero period is treated as one second.
    pub fn start(&self, period_seconds: u64) {
        let ticker = {
            let mut state = lock(&self.state);
            state.phase = ClockPhase::Running;

            match self.kind {
                ClockKind::Timer => {
                    state.target = period_seconds;
                    state.remaining = period_seconds.saturating_sub(state.elapsed);
                    tracing::info!("Timer started for {}s", period_seconds);
                    None
                }
                ClockKind::Stopwatch => {
                    tracing::info!("Stopwatch started, ticking every {}s", period_seconds.max(1));
                    Some(Duration::from_secs(period_seconds.max(1)))
                }
            }
        };

        let state = Arc::clone(&self.state);
        let handle = match ticker {
            None => tokio::spawn(run_timer(state, self.signal.clone())),
            Some(period) => tokio::spawn(run_stopwatch(state, period)),
        };

        let stale = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(stale) = stale {
            stale.abort();
        }
    }

    /// Stop the clock. Safe to call repeatedly.
    pub fn stop(&self) {
        lock(&self.state).phase = ClockPhase::Stopped;
    }

    /// Time as `HH:MM:SS`: remaining for a timer, elapsed for a stopwatch
    pub fn formatted_time(&self) -> String {
        let state = lock(&self.state);
        match self.kind {
            ClockKind::Timer => format_hms(state.remaining),
            ClockKind::Stopwatch => format_hms(state.elapsed.min(MAX_DISPLAY_SECONDS)),
        }
    }

    /// Extend a running or pending timer. Does nothing for a stopwatch.
    pub fn add_time(&self, seconds: u64) {
        match self.kind {
            ClockKind::Timer => {
                let mut state = lock(&self.state);
                state.remaining = state.remaining.saturating_add(seconds);
                state.target = state.target.saturating_add(seconds);
            }
            ClockKind::Stopwatch => {
                tracing::debug!("Ignoring add_time({}) on a stopwatch", seconds);
            }
        }
    }

    pub fn kind(&self) -> ClockKind {
        self.kind
    }

    pub fn phase(&self) -> ClockPhase {
        lock(&self.state).phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == ClockPhase::Running
    }

    pub fn elapsed_seconds(&self) -> u64 {
        lock(&self.state).elapsed
    }

    pub fn remaining_seconds(&self) -> u64 {
        lock(&self.state).remaining
    }

    /// Override the elapsed count, e.g. when restoring saved state
    pub fn set_elapsed_seconds(&self, seconds: u64) {
        lock(&self.state).elapsed = seconds;
    }

    pub fn snapshot(&self) -> ClockSnapshot {
        let state = lock(&self.state);
        ClockSnapshot {
            kind: self.kind,
            phase: state.phase,
            elapsed_seconds: state.elapsed,
            remaining_seconds: state.remaining,
        }
    }

    /// Load counters from a snapshot. The kind and phase are left alone.
    pub fn restore(&self, snapshot: &ClockSnapshot) {
        if snapshot.kind != self.kind {
            tracing::warn!(
                "Restoring a {:?} snapshot into a {:?} clock",
                snapshot.kind,
                self.kind
            );
        }

        let mut state = lock(&self.state);
        state.elapsed = snapshot.elapsed_seconds;
        state.remaining = snapshot.remaining_seconds;
    }
}

impl Drop for ClockEngine {
    fn drop(&mut self) {
        let ticker = self
            .ticker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ticker) = ticker {
            ticker.abort();
        }
    }
}

async fn run_timer(state: SharedState, signal: Option<CompletionSignal>) {
    let mut ticks = tokio::time::interval(Duration::from_secs(1));

    loop {
        ticks.tick().await;

        let finished = {
            let mut clock = lock(&state);
            if clock.phase != ClockPhase::Running {
                break;
            }

            clock.elapsed = clock.elapsed.saturating_add(1);
            let finished = clock.elapsed >= clock.target;
            if finished {
                clock.phase = ClockPhase::Stopped;
            }
            clock.remaining = clock.target.saturating_sub(clock.elapsed);
            finished
        };

        if finished {
            tracing::info!("Timer finished");
            if let Some(signal) = &signal {
                signal.signal_all();
            }
            break;
        }
    }
}

async fn run_stopwatch(state: SharedState, period: Duration) {
    let mut ticks = tokio::time::interval(period);

    loop {
        ticks.tick().await;

        let mut clock = lock(&state);
        if clock.phase != ClockPhase::Running {
            break;
        }
        clock.elapsed = clock.elapsed.saturating_add(1);
    }
}

fn format_hms(total_seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds / 60) % 60,
        total_seconds % 60
    )
}
