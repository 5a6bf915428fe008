//! Thread-safe progress accounting shared by parallel workers
//!
//! Encoder and decoder count abstract work units against a precomputed
//! total; the counter forwards the completed fraction to an injected sink
//! whenever it crosses the next display step.

use crate::io::configuration::{PROGRESS_BAR_WIDTH, PROGRESS_RESOLUTION};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{LazyLock, Mutex, PoisonError};

/// Receiver of progress fractions in `[0, 1]`
pub trait ProgressSink: Send + Sync {
    /// Report the completed fraction
    fn report(&self, fraction: f64);
}

/// Silent sink
impl ProgressSink for () {
    fn report(&self, _fraction: f64) {}
}

impl ProgressSink for ProgressBar {
    fn report(&self, fraction: f64) {
        let position = (fraction.clamp(0.0, 1.0) * PROGRESS_RESOLUTION as f64) as u64;
        if position > self.position() {
            self.set_position(position);
        }
    }
}

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{msg}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{percent:>3}}% ({{elapsed}})"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Create a terminal progress bar labelled with `message`
pub fn progress_bar(message: &str) -> ProgressBar {
    let bar = ProgressBar::new(PROGRESS_RESOLUTION);
    bar.set_style(PROGRESS_STYLE.clone());
    bar.set_message(message.to_string());
    bar
}

#[derive(Debug, Default)]
struct CounterState {
    completed: u64,
    reported_step: u64,
}

/// Work counter reporting coarse, monotonically non-decreasing fractions
pub struct ProgressCounter<'a> {
    sink: &'a dyn ProgressSink,
    total: u64,
    state: Mutex<CounterState>,
}

impl<'a> ProgressCounter<'a> {
    /// Counter over `total` units reporting to `sink`
    pub fn new(sink: &'a dyn ProgressSink, total: u64) -> Self {
        Self {
            sink,
            total: total.max(1),
            state: Mutex::new(CounterState::default()),
        }
    }

    /// Counter that reports nowhere
    pub fn silent(total: u64) -> Self {
        Self::new(&(), total)
    }

    /// Total number of units
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Units completed so far
    pub fn completed(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .completed
    }

    /// Completed fraction, capped at one
    pub fn fraction(&self) -> f64 {
        (self.completed() as f64 / self.total as f64).min(1.0)
    }

    /// Credit `units` of finished work
    pub fn advance(&self, units: u64) {
        if units == 0 {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.completed = state.completed.saturating_add(units).min(self.total);

        let step = state.completed * PROGRESS_RESOLUTION / self.total;
        if step > state.reported_step {
            state.reported_step = step;
            self.sink.report(step as f64 / PROGRESS_RESOLUTION as f64);
        }
    }

    /// Mark all work as done and report completion
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.completed = self.total;
        state.reported_step = PROGRESS_RESOLUTION;
        self.sink.report(1.0);
    }
}
