//! Durable configuration store.
//!
//! Owns the in-memory [`ConfigRecord`] and keeps up to two generations of
//! it on flash:
//!
//! ```text
//!   persist():  record ──▶ config.tmp ──▶ (config.txt ──▶ config.bak) ──▶ config.txt
//!   load():     config.txt ──▶ config.bak ──▶ factory defaults
//! ```
//!
//! The temporary file is fully written and synced before any existing
//! generation is touched, so an interruption at any step leaves either the
//! new primary, the old primary, or the old primary renamed to backup.
//! Storage is mounted only for the duration of one load or persist.

use log::{info, warn};

use crate::config::ConfigRecord;
use crate::error::{Error, Result};

use super::ports::{StorageError, StoragePort};

pub const PRIMARY_FILE: &str = "config.txt";
pub const BACKUP_FILE: &str = "config.bak";
pub const TEMP_FILE: &str = "config.tmp";

/// Where [`ConfigStore::load`] found the configuration it adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Override strap asserted; flash was not consulted.
    FactoryOverride,
    Primary,
    Backup,
    /// No usable generation on flash, or flash unavailable.
    Defaults,
}

impl core::fmt::Display for LoadSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FactoryOverride => write!(f, "factory override"),
            Self::Primary => write!(f, "primary"),
            Self::Backup => write!(f, "backup"),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

/// Result of a successful [`ConfigStore::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written,
    /// The record was clean; storage was not touched.
    NothingToDo,
}

pub struct ConfigStore<S: StoragePort> {
    storage: S,
    record: ConfigRecord,
}

impl<S: StoragePort> ConfigStore<S> {
    /// Start from the factory record.  Nothing is read until [`load`](Self::load).
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            record: ConfigRecord::factory(),
        }
    }

    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut ConfigRecord {
        &mut self.record
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Boot-time load.  Never fails: every problem degrades to the next
    /// generation, and finally to the factory record.  Leaves the record clean.
    pub fn load(&mut self, factory_override: bool) -> LoadSource {
        self.record = ConfigRecord::factory();

        if factory_override {
            info!("config: factory override asserted, flash ignored");
            return LoadSource::FactoryOverride;
        }

        if let Err(e) = self.storage.mount() {
            warn!("config: storage unavailable ({}), using defaults", e);
            return LoadSource::Defaults;
        }

        let mut source = LoadSource::Defaults;
        for (name, from) in [(PRIMARY_FILE, LoadSource::Primary), (BACKUP_FILE, LoadSource::Backup)] {
            match self.read_generation(name) {
                Ok(record) => {
                    self.record = record;
                    source = from;
                    break;
                }
                Err(StorageError::Corrupted) => warn!("config: {} is corrupt, skipping", name),
                Err(e) => info!("config: {} not usable ({})", name, e),
            }
        }

        self.storage.unmount();
        self.record.mark_clean();
        info!(
            "config: loaded from {} (ssid='{}', host='{}', mode={})",
            source,
            self.record.ssid(),
            self.record.hostname(),
            self.record.wifi_mode()
        );
        source
    }

    /// Write the record to flash if it is dirty, rotating the previous
    /// primary to backup.  On failure the record stays dirty.
    pub fn persist(&mut self) -> Result<PersistOutcome> {
        if !self.record.is_dirty() {
            return Ok(PersistOutcome::NothingToDo);
        }

        self.storage.mount()?;
        let result = self.rotate();
        self.storage.unmount();

        match result {
            Ok(()) => {
                self.record.mark_clean();
                info!("config: persisted");
                Ok(PersistOutcome::Written)
            }
            Err(e) => {
                warn!("config: persist failed: {}", e);
                Err(e)
            }
        }
    }

    fn rotate(&mut self) -> Result<()> {
        let text = self.record.render();
        self.storage.write(TEMP_FILE, text.as_bytes())?;

        // Without a primary the backup is the only good generation left.
        if self.storage.exists(PRIMARY_FILE) {
            if self.storage.exists(BACKUP_FILE) {
                self.storage
                    .remove(BACKUP_FILE)
                    .map_err(|_| Error::IncompleteWrite("remove stale backup"))?;
            }
            self.storage
                .rename(PRIMARY_FILE, BACKUP_FILE)
                .map_err(|_| Error::IncompleteWrite("rotate primary to backup"))?;
        }
        self.storage
            .rename(TEMP_FILE, PRIMARY_FILE)
            .map_err(|_| Error::IncompleteWrite("promote new primary"))
    }

    /// Read and parse one generation.  Undecodable text, or a file without
    /// an `ssid` entry, is [`StorageError::Corrupted`].
    fn read_generation(&self, name: &str) -> core::result::Result<ConfigRecord, StorageError> {
        let bytes = self.storage.read(name)?;
        let text = core::str::from_utf8(&bytes).map_err(|_| StorageError::Corrupted)?;
        ConfigRecord::from_file(text).ok_or(StorageError::Corrupted)
    }
}
