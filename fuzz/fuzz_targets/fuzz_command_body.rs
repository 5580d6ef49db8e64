//! Fuzz target: request body parsers + command dispatch
//!
//! Parses arbitrary text as both an actuator body and a config body, then
//! runs the results through a service built on the simulated board and an
//! in-memory store.  Nothing may panic, and a rejected command must leave
//! the actuator untouched.
//!
//! cargo fuzz run fuzz_command_body

#![no_main]

use gatehouse::app::commands::{AppCommand, Reply, parse_actuator_body, parse_config_body};
use gatehouse::app::ports::{GpioPort, StorageError, StoragePort};
use gatehouse::app::service::AppService;
use libfuzzer_sys::fuzz_target;

struct NullGpio;

impl GpioPort for NullGpio {
    fn read(&self, _gpio: i32) -> bool {
        true
    }

    fn write(&self, _gpio: i32, _high: bool) {}
}

#[derive(Default)]
struct NullStorage;

impl StoragePort for NullStorage {
    fn mount(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn unmount(&mut self) {}

    fn read(&self, _name: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound)
    }

    fn write(&mut self, _name: &str, _data: &[u8]) -> Result<(), StorageError> {
        Ok(())
    }

    fn exists(&self, _name: &str) -> bool {
        false
    }

    fn remove(&mut self, _name: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn rename(&mut self, _from: &str, _to: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };
    let mut app = AppService::new(NullGpio, NullStorage);

    if let Ok(action) = parse_actuator_body(body) {
        let before = app.read_actuator(1);
        let reply = app.handle_command(AppCommand::Actuate { id: 1, action });
        if matches!(reply, Reply::Rejected(_)) {
            assert_eq!(app.read_actuator(1), before);
        }
    }

    let updates = parse_config_body(body);
    let _ = app.handle_command(AppCommand::Configure(updates));
});
