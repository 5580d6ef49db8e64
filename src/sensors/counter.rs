//! Falling-edge event counters.
//!
//! Inputs are pulled up, so the idle level is HIGH and an event pulls the
//! line LOW.  Each counter samples its pin once per scheduler tick and counts
//! a HIGH→LOW transition between consecutive samples.  Sampling at the tick
//! rate is the debounce: contact bounce shorter than one period is never
//! seen, and neither are complete pulses that fit between two samples.

use crate::app::ports::GpioPort;
use crate::error::Result;
use crate::pins::{self, COUNTER_GPIOS, Level, MAX_COUNTERS, PeripheralKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Counter {
    count: u32,
    last_level: Level,
}

const IDLE: Counter = Counter {
    count: 0,
    last_level: Level::High,
};

#[derive(Debug)]
pub struct CounterBank {
    slots: [Counter; MAX_COUNTERS],
}

impl CounterBank {
    pub const fn new() -> Self {
        Self {
            slots: [IDLE; MAX_COUNTERS],
        }
    }

    /// Events counted since boot or the last reset.
    pub fn read(&self, id: i32) -> Result<u32> {
        let i = pins::slot(PeripheralKind::Counter, id)?;
        Ok(self.slots[i].count)
    }

    /// Zero the count and forget the last sample.
    pub fn reset(&mut self, id: i32) -> Result<()> {
        let i = pins::slot(PeripheralKind::Counter, id)?;
        self.slots[i] = IDLE;
        Ok(())
    }

    /// Sample every counter pin once.  Runs in the timer context.
    pub fn advance_tick<G: GpioPort + ?Sized>(&mut self, gpio: &G) {
        for (slot, &pin) in self.slots.iter_mut().zip(&COUNTER_GPIOS) {
            let level = Level::from(gpio.read(pin));
            if slot.last_level.is_high() && !level.is_high() {
                slot.count = slot.count.saturating_add(1);
            }
            slot.last_level = level;
        }
    }
}

impl Default for CounterBank {
    fn default() -> Self {
        Self::new()
    }
}
