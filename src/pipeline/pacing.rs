//! Minimum-cycle-time pacing for the worker loops.
//!
//! ```text
//! start = now
//! flow  = unit()
//! work  = now - start
//! Break        -> return, no sleep
//! work <  T    -> sleep(T - work)
//! work >= T    -> overrun, next cycle starts immediately
//! ```
//!
//! The guarantee is a floor: every continuing cycle lasts at least T. A
//! unit of work slower than T is counted and logged, not interrupted.

use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::types::PacingStats;

/// Runs a unit of work repeatedly with cycle time >= `interval`.
#[derive(Debug)]
pub struct PacedWorker {
    name: &'static str,
    interval: Duration,
    stats: PacingStats,
}

impl PacedWorker {
    /// `interval` is expected to be validated (floor-clamped) already.
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            stats: PacingStats::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> PacingStats {
        self.stats
    }

    /// Cycle `unit` until it breaks, returning the break value.
    pub fn run<B, F>(&mut self, mut unit: F) -> B
    where
        F: FnMut() -> ControlFlow<B>,
    {
        loop {
            let start = Instant::now();
            let flow = unit();
            let work = start.elapsed();
            self.record(work);

            if let ControlFlow::Break(value) = flow {
                return value;
            }

            match self.interval.checked_sub(work) {
                Some(remaining) if !remaining.is_zero() => std::thread::sleep(remaining),
                _ => self.overrun(work),
            }
        }
    }

    fn record(&mut self, work: Duration) {
        self.stats.cycles += 1;
        let work_ns = u64::try_from(work.as_nanos()).unwrap_or(u64::MAX);
        self.stats.max_work_ns = self.stats.max_work_ns.max(work_ns);
    }

    fn overrun(&mut self, work: Duration) {
        self.stats.overruns += 1;
        if self.stats.overruns == 1 {
            warn!(
                worker = self.name,
                work_ns = work.as_nanos() as u64,
                interval_ns = self.interval.as_nanos() as u64,
                "Cycle work exceeded interval T, cycle runs long"
            );
        } else {
            debug!(
                worker = self.name,
                work_ns = work.as_nanos() as u64,
                overruns = self.stats.overruns,
                "Cycle overrun"
            );
        }
    }
}
