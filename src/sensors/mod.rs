//! Input side of the board: stateless binary sensors, the factory-override
//! strap, and the tick-sampled event counters in [`counter`].

pub mod counter;

use crate::app::ports::GpioPort;
use crate::error::Result;
use crate::pins::{self, Level, PeripheralKind};

/// Current level of sensor `id`.
pub fn read_sensor<G: GpioPort + ?Sized>(gpio: &G, id: i32) -> Result<Level> {
    let pin = pins::resolve(PeripheralKind::Sensor, id)?;
    Ok(Level::from(gpio.read(pin)))
}

/// `true` while the factory-override strap pulls its pin high.
pub fn factory_override_asserted<G: GpioPort + ?Sized>(gpio: &G) -> bool {
    gpio.read(pins::FACTORY_RESET_GPIO)
}
