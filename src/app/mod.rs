//! Application core: domain logic behind port traits.
//!
//! The peripheral state machines, the configuration store and the command
//! mapping live here.  All interaction with hardware and flash happens
//! through the traits in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod config_store;
pub mod ports;
pub mod service;
