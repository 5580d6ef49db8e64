//! Actuator bank, hardware initialisation and the periodic timer backend.

pub mod actuator;
pub mod hw_init;
pub mod hw_timer;
