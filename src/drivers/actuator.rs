//! Binary actuator bank (relay outputs).
//!
//! Each actuator is either OFF or ON, with an optional pulse countdown
//! measured in scheduler ticks.  While `remaining_ticks > 0` the actuator is
//! ON; the tick that takes the countdown from 1 to 0 switches it OFF.
//!
//! ```text
//!            set(1) / toggle / pulse
//!    ┌─────┐ ─────────────────────▶ ┌────┐
//!    │ OFF │                        │ ON │──┐ pulse armed:
//!    └─────┘ ◀───────────────────── └────┘  │ remaining_ticks counts down
//!        ▲     set(0) / toggle              │
//!        └──────────────────────────────────┘ last tick of the pulse
//! ```
//!
//! The bank owns the state only; pin access is passed in so the same code
//! drives real pads and test doubles.

use crate::app::ports::GpioPort;
use crate::error::{Error, Result};
use crate::pins::{self, ACTUATOR_GPIOS, Level, MAX_ACTUATORS, PeripheralKind};
use crate::scheduler::TICK_INTERVAL_MS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Actuator {
    value: Level,
    remaining_ticks: u32,
}

/// Process-lifetime table of every actuator on the board.
#[derive(Debug)]
pub struct ActuatorBank {
    slots: [Actuator; MAX_ACTUATORS],
}

impl ActuatorBank {
    /// All actuators OFF, no pulse pending.
    pub const fn new() -> Self {
        Self {
            slots: [Actuator {
                value: Level::Low,
                remaining_ticks: 0,
            }; MAX_ACTUATORS],
        }
    }

    /// Drive actuator `id` to `level`, cancelling any pending pulse.
    pub fn set<G: GpioPort + ?Sized>(&mut self, gpio: &G, id: i32, level: Level) -> Result<()> {
        let i = pins::slot(PeripheralKind::Actuator, id)?;
        self.drive(gpio, i, level);
        Ok(())
    }

    /// Flip actuator `id`, cancelling any pending pulse.  Returns the new level.
    pub fn toggle<G: GpioPort + ?Sized>(&mut self, gpio: &G, id: i32) -> Result<Level> {
        let i = pins::slot(PeripheralKind::Actuator, id)?;
        let level = self.slots[i].value.toggled();
        self.drive(gpio, i, level);
        Ok(level)
    }

    /// Switch actuator `id` ON for `duration_ms`, rounded up to whole ticks.
    /// Returns the number of ticks armed.
    pub fn pulse<G: GpioPort + ?Sized>(
        &mut self,
        gpio: &G,
        id: i32,
        duration_ms: i32,
    ) -> Result<u32> {
        let i = pins::slot(PeripheralKind::Actuator, id)?;
        let ticks = pulse_ticks(duration_ms)?;
        self.drive(gpio, i, Level::High);
        self.slots[i].remaining_ticks = ticks;
        Ok(ticks)
    }

    pub fn value(&self, id: i32) -> Result<Level> {
        let i = pins::slot(PeripheralKind::Actuator, id)?;
        Ok(self.slots[i].value)
    }

    pub fn remaining_ticks(&self, id: i32) -> Result<u32> {
        let i = pins::slot(PeripheralKind::Actuator, id)?;
        Ok(self.slots[i].remaining_ticks)
    }

    /// One scheduler period: count down every armed pulse, ending those that
    /// reach zero.  Runs in the timer context.
    pub fn advance_tick<G: GpioPort + ?Sized>(&mut self, gpio: &G) {
        for (slot, &pin) in self.slots.iter_mut().zip(&ACTUATOR_GPIOS) {
            match slot.remaining_ticks {
                0 => {}
                1 => {
                    slot.remaining_ticks = 0;
                    slot.value = Level::Low;
                    gpio.write(pin, false);
                }
                _ => slot.remaining_ticks -= 1,
            }
        }
    }

    fn drive<G: GpioPort + ?Sized>(&mut self, gpio: &G, i: usize, level: Level) {
        let slot = &mut self.slots[i];
        slot.remaining_ticks = 0;
        slot.value = level;
        gpio.write(ACTUATOR_GPIOS[i], level.is_high());
    }
}

impl Default for ActuatorBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Ticks needed to cover `duration_ms`: `max(1, ceil(duration_ms / tick))`.
pub fn pulse_ticks(duration_ms: i32) -> Result<u32> {
    if duration_ms <= 0 {
        return Err(Error::InvalidValue("pulse duration must be positive"));
    }
    Ok((duration_ms as u32).div_ceil(TICK_INTERVAL_MS).max(1))
}
