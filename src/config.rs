//! Device configuration record
//!
//! Network identity, credentials and WiFi operating mode.  Values start at
//! the factory defaults compiled into the image and can be overridden from
//! flash (see [`ConfigStore`](crate::app::config_store::ConfigStore)) or by
//! the request layer through the bounded setters below.
//!
//! ## Persisted format
//!
//! UTF-8 text, one `key=value` per line, terminated by a blank line:
//!
//! ```text
//! ssid=gatehouse
//! password=
//! hostname=gatehouse
//! wifi_mode=AP
//! ```
//!
//! Spaces around `=` are accepted on read.  Unknown keys are ignored.

use core::fmt;
use core::str::FromStr;

use heapless::String;
use log::warn;

use crate::error::{Error, Result};

/// Maximum SSID length in bytes (802.11 limit).
pub const MAX_SSID_LEN: usize = 32;
/// Maximum password / hostname length in bytes.
pub const MAX_CFG_VALUE_LEN: usize = 63;

/// Factory defaults.  Override at build time through the environment, e.g.
/// `GATEHOUSE_WIFI_SSID=lobby cargo build --features espidf`.
pub mod defaults {
    use super::{MAX_CFG_VALUE_LEN, MAX_SSID_LEN, WifiMode};

    pub const SSID: &str = match option_env!("GATEHOUSE_WIFI_SSID") {
        Some(s) => s,
        None => "gatehouse",
    };
    /// Empty = open access point, so a reset board is always reachable.
    pub const PASSWORD: &str = match option_env!("GATEHOUSE_WIFI_PASSWORD") {
        Some(s) => s,
        None => "",
    };
    pub const HOSTNAME: &str = match option_env!("GATEHOUSE_HOSTNAME") {
        Some(s) => s,
        None => "gatehouse",
    };
    pub const WIFI_MODE: WifiMode = WifiMode::AccessPoint;

    const _: () = assert!(SSID.len() <= MAX_SSID_LEN && !SSID.is_empty());
    const _: () = assert!(PASSWORD.len() <= MAX_CFG_VALUE_LEN);
    const _: () = assert!(HOSTNAME.len() <= MAX_CFG_VALUE_LEN && !HOSTNAME.is_empty());
}

// ---------------------------------------------------------------------------
// WiFi mode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiMode {
    /// Join an existing network.
    Station,
    /// Host our own network.
    AccessPoint,
}

impl WifiMode {
    /// Token used in the config file and request bodies.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Station => "STA",
            Self::AccessPoint => "AP",
        }
    }
}

impl FromStr for WifiMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "STA" => Ok(Self::Station),
            "AP" => Ok(Self::AccessPoint),
            _ => Err(Error::InvalidValue("wifi_mode must be STA or AP")),
        }
    }
}

impl fmt::Display for WifiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Ssid,
    Password,
    Hostname,
    WifiMode,
}

impl ConfigKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ssid => "ssid",
            Self::Password => "password",
            Self::Hostname => "hostname",
            Self::WifiMode => "wifi_mode",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ();

    fn from_str(s: &str) -> core::result::Result<Self, ()> {
        match s {
            "ssid" => Ok(Self::Ssid),
            "password" => Ok(Self::Password),
            "hostname" => Ok(Self::Hostname),
            "wifi_mode" => Ok(Self::WifiMode),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split one line of a config file or request body into a known key and its
/// value.  Returns `None` for blank lines, lines without `=`, and unknown keys.
///
/// The value is everything after the first `=`, kept byte for byte, since
/// passwords and SSIDs may start or end with spaces.  The one exception is
/// the hand-edited ` = ` separator: when the key is followed by whitespace,
/// a single space after `=` belongs to the separator.  [`ConfigRecord::render`]
/// never writes that form.
pub fn parse_line(line: &str) -> Option<(ConfigKey, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (key, value) = line.split_once('=')?;
    let spaced = key.ends_with([' ', '\t']);
    let key = key.trim().parse().ok()?;
    let value = if spaced {
        value.strip_prefix(' ').unwrap_or(value)
    } else {
        value
    };
    Some((key, value))
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// In-memory configuration.  Rejected writes leave the record untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigRecord {
    ssid: String<MAX_SSID_LEN>,
    password: String<MAX_CFG_VALUE_LEN>,
    hostname: String<MAX_CFG_VALUE_LEN>,
    wifi_mode: WifiMode,
    /// Differs from what is on flash.
    dirty: bool,
}

impl ConfigRecord {
    /// The compiled-in factory configuration (clean).
    pub fn factory() -> Self {
        // Lengths are checked at compile time in `defaults`.
        Self {
            ssid: String::try_from(defaults::SSID).unwrap_or_default(),
            password: String::try_from(defaults::PASSWORD).unwrap_or_default(),
            hostname: String::try_from(defaults::HOSTNAME).unwrap_or_default(),
            wifi_mode: defaults::WIFI_MODE,
            dirty: false,
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn wifi_mode(&self) -> WifiMode {
        self.wifi_mode
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn set_ssid(&mut self, ssid: &str) -> Result<()> {
        self.ssid = bounded(ssid, "ssid longer than 32 bytes")?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.password = bounded(password, "password longer than 63 bytes")?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_hostname(&mut self, hostname: &str) -> Result<()> {
        self.hostname = bounded(hostname, "hostname longer than 63 bytes")?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_wifi_mode(&mut self, mode: WifiMode) {
        self.wifi_mode = mode;
        self.dirty = true;
    }

    /// Route a textual `key=value` pair through the matching setter.
    pub fn apply(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::Ssid => self.set_ssid(value),
            ConfigKey::Password => self.set_password(value),
            ConfigKey::Hostname => self.set_hostname(value),
            ConfigKey::WifiMode => {
                self.set_wifi_mode(value.parse()?);
                Ok(())
            }
        }
    }

    /// Build a record from a persisted file, starting from the factory values.
    ///
    /// Returns `None` when the file has no usable `ssid` entry, which is how a
    /// corrupt generation is recognised.  Empty values are skipped except for
    /// `password` (open network).
    pub fn from_file(text: &str) -> Option<Self> {
        let mut record = Self::factory();
        let mut has_ssid = false;

        for (key, value) in text.lines().filter_map(parse_line) {
            if value.is_empty() && key != ConfigKey::Password {
                continue;
            }
            match record.apply(key, value) {
                Ok(()) => has_ssid |= key == ConfigKey::Ssid,
                Err(e) => warn!("config: ignoring '{}' entry ({})", key, e),
            }
        }

        record.dirty = false;
        has_ssid.then_some(record)
    }

    /// Serialise to the persisted file format.
    pub fn render(&self) -> std::string::String {
        format!(
            "{}={}\n{}={}\n{}={}\n{}={}\n\n",
            ConfigKey::Ssid,
            self.ssid,
            ConfigKey::Password,
            self.password,
            ConfigKey::Hostname,
            self.hostname,
            ConfigKey::WifiMode,
            self.wifi_mode,
        )
    }
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self::factory()
    }
}

impl fmt::Debug for ConfigRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRecord")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("hostname", &self.hostname)
            .field("wifi_mode", &self.wifi_mode)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Copy `s` into a fixed-capacity string, or reject it whole.
///
/// Line terminators are refused too: the file format has no escaping.
fn bounded<const N: usize>(s: &str, too_long: &'static str) -> Result<String<N>> {
    if s.contains(['\n', '\r']) {
        return Err(Error::InvalidValue("line break in config value"));
    }
    String::try_from(s).map_err(|_| Error::InvalidValue(too_long))
}
