//! GPIO / peripheral pin assignments for the gatehouse controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers, and this is the only place where an abstract
//! peripheral id (actuator 1, sensor 2, ...) is turned into a GPIO.
//!
//! Ids are 1-based and independent of the GPIO they are wired to.

use core::fmt;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Actuators (binary outputs, relay drivers)
// ---------------------------------------------------------------------------

/// Actuator 1..=4, in id order.
pub const ACTUATOR_GPIOS: [i32; MAX_ACTUATORS] = [18, 19, 22, 23];
pub const MAX_ACTUATORS: usize = 4;

// ---------------------------------------------------------------------------
// Sensors (binary inputs, pulled up)
// ---------------------------------------------------------------------------

/// Sensor 1..=2, in id order.
pub const SENSOR_GPIOS: [i32; MAX_SENSORS] = [32, 33];
pub const MAX_SENSORS: usize = 2;

// ---------------------------------------------------------------------------
// Counters (pulled-up inputs sampled by the tick; falling edges are counted)
// ---------------------------------------------------------------------------

/// Counter 1, in id order.
pub const COUNTER_GPIOS: [i32; MAX_COUNTERS] = [4];
pub const MAX_COUNTERS: usize = 1;

// ---------------------------------------------------------------------------
// Factory override
// ---------------------------------------------------------------------------

/// Input-only pin.  HIGH = use factory configuration and ignore flash.
/// The pull resistor is fitted on the board, not enabled in the pad.
pub const FACTORY_RESET_GPIO: i32 = 35;

// ---------------------------------------------------------------------------
// Logic levels
// ---------------------------------------------------------------------------

/// A binary pin level as seen by the application (0 / 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// The opposite level.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Numeric form used on the wire.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl TryFrom<i32> for Level {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            _ => Err(Error::InvalidValue("level must be 0 or 1")),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

// ---------------------------------------------------------------------------
// Peripheral table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralKind {
    Actuator,
    Sensor,
    Counter,
}

impl PeripheralKind {
    /// Number of peripherals of this kind fitted on the board.
    pub const fn count(self) -> usize {
        match self {
            Self::Actuator => MAX_ACTUATORS,
            Self::Sensor => MAX_SENSORS,
            Self::Counter => MAX_COUNTERS,
        }
    }

    const fn gpios(self) -> &'static [i32] {
        match self {
            Self::Actuator => &ACTUATOR_GPIOS,
            Self::Sensor => &SENSOR_GPIOS,
            Self::Counter => &COUNTER_GPIOS,
        }
    }
}

impl fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator => write!(f, "actuator"),
            Self::Sensor => write!(f, "sensor"),
            Self::Counter => write!(f, "counter"),
        }
    }
}

/// Zero-based table index for a 1-based peripheral id.
pub fn slot(kind: PeripheralKind, id: i32) -> Result<usize> {
    if id >= 1 && (id as usize) <= kind.count() {
        Ok(id as usize - 1)
    } else {
        Err(Error::InvalidId { kind, id })
    }
}

/// Resolve a peripheral id to the GPIO it is wired to.
pub fn resolve(kind: PeripheralKind, id: i32) -> Result<i32> {
    slot(kind, id).map(|i| kind.gpios()[i])
}
