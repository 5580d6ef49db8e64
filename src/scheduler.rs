//! Fixed-period tick scheduler.
//!
//! Drives every time-based behaviour in the firmware: pulse countdowns on
//! the actuators and edge sampling on the counters.
//!
//! ```text
//!   PeriodicTimer (esp_timer task / sim thread)
//!        │ every TICK_INTERVAL_MS
//!        ▼
//!   TickTarget::advance_tick()  ──▶  actuators, then counters
//! ```
//!
//! The scheduler knows nothing about peripherals; it only holds an
//! `Arc<dyn TickTarget>` and a count of completed firings.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use core::time::Duration;
use log::{info, warn};

use crate::app::ports::TickTarget;
use crate::drivers::hw_timer::{PeriodicTimer, TimerError};

/// Tick period.  Pulse durations are rounded up to a multiple of this.
pub const TICK_INTERVAL_MS: u32 = 100;

pub struct TickScheduler {
    timer: Option<PeriodicTimer>,
    ticks: Arc<AtomicU64>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            timer: None,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start advancing `target` once per period.  A second call while
    /// running is ignored.
    pub fn start<T>(&mut self, target: Arc<T>) -> Result<(), TimerError>
    where
        T: TickTarget + ?Sized + 'static,
    {
        if self.is_running() {
            warn!("scheduler: already running");
            return Ok(());
        }

        let ticks = Arc::clone(&self.ticks);
        let timer = PeriodicTimer::start(
            "tick",
            Duration::from_millis(u64::from(TICK_INTERVAL_MS)),
            move || {
                target.advance_tick();
                ticks.fetch_add(1, Ordering::Relaxed);
            },
        )?;
        self.timer = Some(timer);
        info!("scheduler: ticking every {} ms", TICK_INTERVAL_MS);
        Ok(())
    }

    /// Stop the driver.  No tick is in flight once this returns.
    pub fn stop(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
            info!("scheduler: stopped after {} ticks", self.ticks());
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(PeriodicTimer::is_running)
    }

    /// Completed firings since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
