//! Runs cycles once or periodically.
//!
//! The daemon sleeps `interval` after each cycle ends, so two cycles never
//! overlap and consecutive starts are at least `interval` apart. The sleep is
//! cut into slices of at most [POLL_INTERVAL] so a stop request is noticed
//! before the next cycle begins. A cycle already running is never interrupted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::orchestrator::CycleResult;

/// Longest uninterrupted sleep while waiting for the next cycle
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Source of time for the scheduler
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time and real sleeping
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Something that can run one build-and-release cycle
pub trait CycleRunner {
    fn run_cycle(&mut self) -> CycleResult;
}

/// How a daemon loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonSummary {
    pub cycles: u64,
    pub failures: u64,
}

pub struct Scheduler<C: CycleRunner, K: Clock = SystemClock> {
    runner: C,
    clock: K,
}

impl<C: CycleRunner> Scheduler<C, SystemClock> {
    pub fn new(runner: C) -> Self {
        Scheduler::with_clock(runner, SystemClock)
    }
}

impl<C: CycleRunner, K: Clock> Scheduler<C, K> {
    pub fn with_clock(runner: C, clock: K) -> Self {
        Scheduler { runner, clock }
    }

    pub fn runner(&self) -> &C {
        &self.runner
    }

    /// Run a single cycle.
    ///
    /// # Returns
    /// * `true` - The cycle succeeded
    /// * `false` - A stage failed
    pub fn run_once(&mut self) -> bool {
        self.runner.run_cycle().success
    }

    /// Run cycles until `stop` is set.
    ///
    /// A failed cycle is logged and the loop carries on after the interval.
    pub fn run_daemon(&mut self, interval: Duration, stop: &AtomicBool) -> DaemonSummary {
        let mut summary = DaemonSummary {
            cycles: 0,
            failures: 0,
        };

        info!(interval_secs = interval.as_secs(), "daemon started");
        while !stop.load(Ordering::SeqCst) {
            let result = self.runner.run_cycle();
            summary.cycles += 1;
            if !result.success {
                summary.failures += 1;
                warn!(
                    stage = %result.stage_reached,
                    "cycle failed, retrying after the interval"
                );
            }

            if stop.load(Ordering::SeqCst) {
                break;
            }
            let next = chrono::Local::now()
                + chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::zero());
            info!(next_cycle = %next.format("%Y-%m-%d %H:%M:%S"), "waiting for next cycle");
            self.wait(interval, stop);
        }

        info!(cycles = summary.cycles, failures = summary.failures, "daemon stopped");
        summary
    }

    /// Sleep `interval` in slices, returning early once `stop` is set
    fn wait(&self, interval: Duration, stop: &AtomicBool) {
        let deadline = self.clock.now() + interval;
        loop {
            if stop.load(Ordering::SeqCst) {
                return;
            }
            let now = self.clock.now();
            if now >= deadline {
                return;
            }
            self.clock.sleep((deadline - now).min(POLL_INTERVAL));
        }
    }
}
