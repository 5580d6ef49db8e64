//! GPIO adapter: bridges the board's pads to [`GpioPort`].
//!
//! Pins must already be configured by
//! [`hw_init::init_peripherals`](crate::drivers::hw_init::init_peripherals).
//! On non-espidf targets the underlying helpers use the simulated pad
//! bitmask.

use crate::app::ports::GpioPort;
use crate::drivers::hw_init;

/// Zero-sized handle; all state lives in the pad registers.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }
}

impl GpioPort for EspGpio {
    fn read(&self, gpio: i32) -> bool {
        hw_init::gpio_read(gpio)
    }

    fn write(&self, gpio: i32, high: bool) {
        hw_init::gpio_write(gpio, high);
    }
}
