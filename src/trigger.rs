//! Periodic trigger for sampling ticks.
//!
//! Keeps a fixed schedule of `start + n * period`. A tick that overruns its
//! slot restarts the schedule from the current instant rather than firing a
//! burst of catch-up ticks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Longest uninterrupted sleep, so shutdown requests are noticed quickly.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Fires at a target frequency.
#[derive(Debug, Clone)]
pub struct PeriodicTrigger {
    period: Duration,
    next: Instant,
}

impl PeriodicTrigger {
    /// Create a trigger firing `hz` times per second, first firing one
    /// period from now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrequency`] unless `hz` is positive, finite
    /// and yields a representable period.
    pub fn from_frequency(hz: f64) -> Result<Self> {
        Self::starting_at(hz, Instant::now())
    }

    /// Same as [`PeriodicTrigger::from_frequency`] with an explicit start.
    pub fn starting_at(hz: f64, start: Instant) -> Result<Self> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(Error::InvalidFrequency(hz));
        }
        let period = Duration::try_from_secs_f64(1.0 / hz)
            .ok()
            .filter(|p| !p.is_zero())
            .ok_or(Error::InvalidFrequency(hz))?;

        Ok(Self {
            period,
            next: start + period,
        })
    }

    /// Nominal time between ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time left before the next tick is due.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Whether a tick is due at `now`; if so the schedule moves on.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.period;
        if self.next <= now {
            // Overran at least one whole period
            self.next = now + self.period;
        }
        true
    }

    /// Block until the next tick is due.
    ///
    /// Returns `false` without waiting further once `running` is cleared.
    pub fn wait(&mut self, running: &AtomicBool) -> bool {
        loop {
            if !running.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if self.poll(now) {
                return true;
            }
            std::thread::sleep(self.time_until_next(now).min(SLEEP_SLICE));
        }
    }
}

/// Validate a frequency given on the command line.
pub fn parse_frequency(s: &str) -> std::result::Result<f64, String> {
    let hz: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a number"))?;
    PeriodicTrigger::starting_at(hz, Instant::now())
        .map(|_| hz)
        .map_err(|e| e.to_string())
}
