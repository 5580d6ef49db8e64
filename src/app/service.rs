//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the configuration store and shares the
//! [`PeripheralHub`] with the tick scheduler.  It exposes every operation
//! the request layer may invoke.  All I/O flows through port traits
//! injected at construction, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!              ┌──────────────────────────────┐
//!  requests ──▶│          AppService           │──▶ StoragePort
//!              │  ConfigStore · PeripheralHub  │
//!              └──────────────┬───────────────┘
//!                             │ Arc
//!  TickScheduler ─────────────┴──▶ PeripheralHub ──▶ GpioPort
//! ```
//!
//! ## Locking
//!
//! The actuator and counter tables each sit behind their own
//! critical-section mutex, held for exactly one operation or one tick.  The
//! configuration is reached only through `&mut self`, so there is a single
//! writer by construction and no lock is needed for it.

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{info, warn};

use crate::config::{ConfigKey, ConfigRecord, WifiMode};
use crate::drivers::actuator::ActuatorBank;
use crate::error::{Error, Result};
use crate::pins::{self, Level, PeripheralKind};
use crate::sensors::{self, counter::CounterBank};

use super::commands::{ActuatorAction, AppCommand, ConfigUpdate, Reply};
use super::config_store::{ConfigStore, LoadSource, PersistOutcome};
use super::ports::{GpioPort, StoragePort, TickTarget};

// ───────────────────────────────────────────────────────────────
// PeripheralHub
// ───────────────────────────────────────────────────────────────

/// Peripheral state shared between the request context and the tick timer.
pub struct PeripheralHub<G: GpioPort> {
    gpio: G,
    actuators: Mutex<CriticalSectionRawMutex, RefCell<ActuatorBank>>,
    counters: Mutex<CriticalSectionRawMutex, RefCell<CounterBank>>,
}

impl<G: GpioPort> PeripheralHub<G> {
    pub fn new(gpio: G) -> Self {
        Self {
            gpio,
            actuators: Mutex::new(RefCell::new(ActuatorBank::new())),
            counters: Mutex::new(RefCell::new(CounterBank::new())),
        }
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    fn with_actuators<R>(&self, f: impl FnOnce(&mut ActuatorBank, &G) -> R) -> R {
        self.actuators.lock(|bank| f(&mut bank.borrow_mut(), &self.gpio))
    }

    fn with_counters<R>(&self, f: impl FnOnce(&mut CounterBank, &G) -> R) -> R {
        self.counters.lock(|bank| f(&mut bank.borrow_mut(), &self.gpio))
    }

    pub fn set_actuator(&self, id: i32, level: Level) -> Result<()> {
        self.with_actuators(|bank, gpio| bank.set(gpio, id, level))
    }

    pub fn toggle_actuator(&self, id: i32) -> Result<Level> {
        self.with_actuators(|bank, gpio| bank.toggle(gpio, id))
    }

    pub fn pulse_actuator(&self, id: i32, duration_ms: i32) -> Result<u32> {
        self.with_actuators(|bank, gpio| bank.pulse(gpio, id, duration_ms))
    }

    pub fn actuator_value(&self, id: i32) -> Result<Level> {
        self.with_actuators(|bank, _| bank.value(id))
    }

    pub fn actuator_remaining_ticks(&self, id: i32) -> Result<u32> {
        self.with_actuators(|bank, _| bank.remaining_ticks(id))
    }

    /// Value and pulse countdown read under one lock, so a tick cannot land
    /// between them.
    pub fn actuator_state(&self, id: i32) -> Result<(Level, u32)> {
        self.with_actuators(|bank, _| Ok((bank.value(id)?, bank.remaining_ticks(id)?)))
    }

    pub fn read_counter(&self, id: i32) -> Result<u32> {
        self.with_counters(|bank, _| bank.read(id))
    }

    pub fn reset_counter(&self, id: i32) -> Result<()> {
        self.with_counters(|bank, _| bank.reset(id))
    }

    pub fn read_sensor(&self, id: i32) -> Result<Level> {
        sensors::read_sensor(&self.gpio, id)
    }

    pub fn factory_override_asserted(&self) -> bool {
        sensors::factory_override_asserted(&self.gpio)
    }
}

impl<G: GpioPort> TickTarget for PeripheralHub<G> {
    /// Actuators first, then counters; each table locked on its own.
    fn advance_tick(&self) {
        self.with_actuators(|bank, gpio| bank.advance_tick(gpio));
        self.with_counters(|bank, gpio| bank.advance_tick(gpio));
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<G: GpioPort, S: StoragePort> {
    hub: Arc<PeripheralHub<G>>,
    store: ConfigStore<S>,
}

impl<G: GpioPort, S: StoragePort> AppService<G, S> {
    /// Peripherals idle, configuration at factory values.  Call
    /// [`load_config`](Self::load_config) before serving requests.
    pub fn new(gpio: G, storage: S) -> Self {
        Self {
            hub: Arc::new(PeripheralHub::new(gpio)),
            store: ConfigStore::new(storage),
        }
    }

    /// Shared handle for the tick scheduler.
    pub fn hub(&self) -> Arc<PeripheralHub<G>> {
        Arc::clone(&self.hub)
    }

    pub fn storage(&self) -> &S {
        self.store.storage()
    }

    pub fn storage_mut(&mut self) -> &mut S {
        self.store.storage_mut()
    }

    // ── Status ────────────────────────────────────────────────

    pub fn get_status(&self) -> String {
        format!(
            "Control module\nVersion:{}\nActuators:{}\nSensors:{}\nCounters:{}\n\n",
            env!("CARGO_PKG_VERSION"),
            PeripheralKind::Actuator.count(),
            PeripheralKind::Sensor.count(),
            PeripheralKind::Counter.count(),
        )
    }

    // ── Peripherals ───────────────────────────────────────────

    pub fn read_sensor(&self, id: i32) -> Result<Level> {
        logged("read_sensor", self.hub.read_sensor(id))
    }

    pub fn read_counter(&self, id: i32) -> Result<u32> {
        logged("read_counter", self.hub.read_counter(id))
    }

    pub fn reset_counter(&self, id: i32) -> Result<()> {
        logged("reset_counter", self.hub.reset_counter(id))
    }

    /// `value` must be 0 or 1.
    pub fn set_actuator(&self, id: i32, value: i32) -> Result<()> {
        let result = pins::slot(PeripheralKind::Actuator, id)
            .and_then(|_| Level::try_from(value))
            .and_then(|level| self.hub.set_actuator(id, level));
        logged("set_actuator", result)
    }

    pub fn toggle_actuator(&self, id: i32) -> Result<Level> {
        logged("toggle_actuator", self.hub.toggle_actuator(id))
    }

    /// Returns the number of ticks the pulse was armed for.
    pub fn pulse_actuator(&self, id: i32, duration_ms: i32) -> Result<u32> {
        logged("pulse_actuator", self.hub.pulse_actuator(id, duration_ms))
    }

    pub fn read_actuator(&self, id: i32) -> Result<Level> {
        logged("read_actuator", self.hub.actuator_value(id))
    }

    pub fn is_factory_override_asserted(&self) -> bool {
        self.hub.factory_override_asserted()
    }

    // ── Configuration ─────────────────────────────────────────

    pub fn config(&self) -> &ConfigRecord {
        self.store.record()
    }

    pub fn ssid(&self) -> &str {
        self.store.record().ssid()
    }

    pub fn password(&self) -> &str {
        self.store.record().password()
    }

    pub fn hostname(&self) -> &str {
        self.store.record().hostname()
    }

    pub fn wifi_mode(&self) -> WifiMode {
        self.store.record().wifi_mode()
    }

    pub fn is_config_dirty(&self) -> bool {
        self.store.record().is_dirty()
    }

    pub fn set_ssid(&mut self, ssid: &str) -> Result<()> {
        logged("set_ssid", self.store.record_mut().set_ssid(ssid))
    }

    pub fn set_password(&mut self, password: &str) -> Result<()> {
        logged("set_password", self.store.record_mut().set_password(password))
    }

    pub fn set_hostname(&mut self, hostname: &str) -> Result<()> {
        logged("set_hostname", self.store.record_mut().set_hostname(hostname))
    }

    pub fn set_wifi_mode(&mut self, mode: WifiMode) {
        self.store.record_mut().set_wifi_mode(mode);
    }

    /// Boot-time load, honouring the factory-override strap.
    pub fn load_config(&mut self) -> LoadSource {
        let asserted = self.hub.factory_override_asserted();
        self.store.load(asserted)
    }

    pub fn persist_config(&mut self) -> Result<PersistOutcome> {
        self.store.persist()
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute one command from the request layer.
    pub fn handle_command(&mut self, cmd: AppCommand) -> Reply {
        match cmd {
            AppCommand::GetStatus => Reply::Text(self.get_status()),
            AppCommand::ReadSensor(id) => self.read_sensor(id).into(),
            AppCommand::ReadActuator(id) => self.read_actuator(id).into(),
            AppCommand::ReadCounter(id) => self.read_counter(id).into(),
            AppCommand::ResetCounter(id) => self.reset_counter(id).into(),
            AppCommand::Actuate { id, action } => self.actuate(id, action),
            AppCommand::QueryFactoryOverride => {
                Reply::Level(self.is_factory_override_asserted().into())
            }
            AppCommand::ReadConfig(key) => Reply::Text(self.config_value(key)),
            AppCommand::Configure(updates) => self.configure(&updates),
            AppCommand::LoadConfig => Reply::Text(self.load_config().to_string()),
            AppCommand::PersistConfig => persist_reply(self.persist_config()),
        }
    }

    fn actuate(&self, id: i32, action: ActuatorAction) -> Reply {
        match action {
            ActuatorAction::Off => self.set_actuator(id, 0).map(|()| Level::Low).into(),
            ActuatorAction::On => self.set_actuator(id, 1).map(|()| Level::High).into(),
            ActuatorAction::Toggle => self.toggle_actuator(id).into(),
            ActuatorAction::Pulse { duration_ms } => self.pulse_actuator(id, duration_ms).into(),
        }
    }

    fn config_value(&self, key: ConfigKey) -> String {
        let record = self.store.record();
        match key {
            ConfigKey::Ssid => record.ssid().into(),
            ConfigKey::Password => record.password().into(),
            ConfigKey::Hostname => record.hostname().into(),
            ConfigKey::WifiMode => record.wifi_mode().token().into(),
        }
    }

    /// Apply every update, then persist whatever was accepted.  A persist
    /// failure wins over a rejected update in the reply.
    fn configure(&mut self, updates: &[ConfigUpdate]) -> Reply {
        let mut first_rejection: Option<Error> = None;
        for update in updates {
            let applied = self.store.record_mut().apply(update.key, &update.value);
            if let Err(e) = logged("configure", applied) {
                first_rejection.get_or_insert(e);
            }
        }

        let persisted = self.persist_config();
        match (persisted, first_rejection) {
            (Err(e), _) | (Ok(_), Some(e)) => Reply::Rejected(e),
            (Ok(outcome), None) => {
                info!("configure: {} update(s) applied", updates.len());
                persist_reply(Ok(outcome))
            }
        }
    }
}

fn persist_reply(result: Result<PersistOutcome>) -> Reply {
    match result {
        Ok(PersistOutcome::Written) => Reply::Created,
        Ok(PersistOutcome::NothingToDo) => Reply::NothingToDo,
        Err(e) => Reply::Rejected(e),
    }
}

/// Log a rejected request.  Rejections never change state.
fn logged<T>(op: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        warn!("{}: {}", op, e);
    }
    result
}
