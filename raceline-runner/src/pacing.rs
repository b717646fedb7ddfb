//! Wall-clock pacing for interactive runs.
use std::thread;
use std::time::{Duration, Instant};

use raceline_sim::TickClock;

/// Tick rate the circuit was originally tuned at.
pub const REFERENCE_TICK_RATE: f64 = 360.0;

/// Reports a fixed simulated `dt` but sleeps so ticks happen at most
/// `ticks_per_second` times per second. Pacing never changes results.
#[derive(Debug, Clone)]
pub struct PacedClock {
    dt: f64,
    period: Option<Duration>,
    next_deadline: Option<Instant>,
}

impl PacedClock {
    /// A non-positive or non-finite rate disables pacing.
    pub fn new(dt: f64, ticks_per_second: f64) -> Self {
        let period = if ticks_per_second.is_finite() && ticks_per_second > 0.0 {
            Duration::try_from_secs_f64(ticks_per_second.recip()).ok()
        } else {
            None
        };
        Self {
            dt,
            period,
            next_deadline: None,
        }
    }

    pub const fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl TickClock for PacedClock {
    fn next_dt(&mut self) -> f64 {
        if let Some(period) = self.period {
            let now = Instant::now();
            let deadline = self.next_deadline.unwrap_or(now);
            if deadline > now {
                thread::sleep(deadline - now);
            }
            self.next_deadline = Some(deadline.max(now) + period);
        }
        self.dt
    }
}
