//! Inbound commands to the application service.
//!
//! These represent requests from the outside world (the HTTP layer, a
//! serial console, tests) that the [`AppService`](super::service::AppService)
//! interprets and acts upon, plus the parsers for the plain-text request
//! bodies the request layer forwards verbatim.
//!
//! Request bodies are newline-separated `key=value` lines, already
//! percent-decoded:
//!
//! ```text
//! action=pulse          ssid=lobby
//! duration=500          wifi_mode=STA
//! ```

use log::warn;

use crate::config::{self, ConfigKey};
use crate::error::{Error, Result};
use crate::pins::Level;

/// What to do with one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorAction {
    Off,
    On,
    Toggle,
    /// ON for `duration_ms`, then OFF on its own.
    Pulse { duration_ms: i32 },
}

/// One textual configuration change, applied through the bounded setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub key: ConfigKey,
    pub value: String,
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Board summary (peripheral counts, firmware version).
    GetStatus,
    ReadSensor(i32),
    ReadActuator(i32),
    ReadCounter(i32),
    ResetCounter(i32),
    Actuate { id: i32, action: ActuatorAction },
    /// Current state of the factory-override strap.
    QueryFactoryOverride,
    /// Read one configuration value.
    ReadConfig(ConfigKey),
    /// Apply every update, then persist.
    Configure(Vec<ConfigUpdate>),
    /// Re-run the boot-time load.
    LoadConfig,
    PersistConfig,
}

/// Outcome of [`AppService::handle_command`](super::service::AppService::handle_command).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Level(Level),
    /// Counter value, or ticks armed by a pulse.
    Count(u32),
    /// Accepted, nothing to report.
    Done,
    /// Configuration written to flash.
    Created,
    /// Persist requested on a clean record.
    NothingToDo,
    Rejected(Error),
}

impl<T> From<Result<T>> for Reply
where
    T: Into<Reply>,
{
    fn from(r: Result<T>) -> Self {
        r.map_or_else(Reply::Rejected, Into::into)
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Reply::Done
    }
}

impl From<Level> for Reply {
    fn from(level: Level) -> Self {
        Reply::Level(level)
    }
}

impl From<u32> for Reply {
    fn from(n: u32) -> Self {
        Reply::Count(n)
    }
}

/// Parse an actuator request body (`action=` plus `duration=` for pulses).
pub fn parse_actuator_body(body: &str) -> Result<ActuatorAction> {
    let mut action = None;
    let mut duration = None;

    for line in body.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "action" => action = Some(value.trim()),
            "duration" => {
                let ms = value
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| Error::InvalidValue("duration is not an integer"))?;
                duration = Some(ms);
            }
            other => warn!("commands: ignoring actuator field '{}'", other),
        }
    }

    match action {
        Some("off") => Ok(ActuatorAction::Off),
        Some("on") => Ok(ActuatorAction::On),
        Some("toggle") => Ok(ActuatorAction::Toggle),
        Some("pulse") => duration
            .map(|duration_ms| ActuatorAction::Pulse { duration_ms })
            .ok_or(Error::InvalidValue("pulse needs a duration")),
        Some(_) => Err(Error::InvalidValue("unknown actuator action")),
        None => Err(Error::InvalidValue("missing actuator action")),
    }
}

/// Parse a configuration request body into updates, in body order.
///
/// Unknown keys are skipped.  Values arrive already decoded and are passed on
/// byte for byte (see [`config::parse_line`]); the setters validate them when
/// the updates are applied.
pub fn parse_config_body(body: &str) -> Vec<ConfigUpdate> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = config::parse_line(line);
            if parsed.is_none() {
                warn!("commands: ignoring config line '{}'", line);
            }
            parsed
        })
        .map(|(key, value)| ConfigUpdate {
            key,
            value: value.into(),
        })
        .collect()
}
