//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (GPIO pads, flash filesystem) implement these traits.
//! The [`AppService`](super::service::AppService) consumes them via
//! generics, so the domain core never touches hardware directly.

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain ↔ pads)
// ───────────────────────────────────────────────────────────────

/// Raw pin access by GPIO number.
///
/// Takes `&self` because pad registers are shared by the request task and
/// the tick timer; mutual exclusion is the caller's business (see
/// [`PeripheralHub`](super::service::PeripheralHub)).  Implementations must
/// not block: these calls are made from the tick context.
pub trait GpioPort: Send + Sync {
    /// Current input level (`true` = high).
    fn read(&self, gpio: i32) -> bool;

    /// Drive an output pin.
    fn write(&self, gpio: i32, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Durable file storage holding the configuration generations.
///
/// Every file operation is only valid between [`mount`](Self::mount) and
/// [`unmount`](Self::unmount).  `write` must not return before the data has
/// reached the medium.
pub trait StoragePort {
    fn mount(&mut self) -> Result<(), StorageError>;

    fn unmount(&mut self);

    /// Read a whole file.  Returns raw bytes; decoding is the caller's job.
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or truncate `name` and write `data` to it.
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    fn exists(&self, name: &str) -> bool;

    fn remove(&mut self, name: &str) -> Result<(), StorageError>;

    /// Rename `from` to `to`.  `to` must not exist.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Tick target (decouples the tick driver from the peripherals)
// ───────────────────────────────────────────────────────────────

/// Something the [`TickScheduler`](crate::scheduler::TickScheduler) advances
/// once per period.
///
/// Called from the timer context: must not block, allocate, or perform
/// durable I/O.
pub trait TickTarget: Send + Sync {
    fn advance_tick(&self);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Partition missing, or mount/format failed.
    MountFailed,
    /// Requested file does not exist.
    NotFound,
    /// Generic I/O error from the filesystem.
    Io,
    /// File exists but its contents are unusable.
    Corrupted,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MountFailed => write!(f, "mount failed"),
            Self::NotFound => write!(f, "file not found"),
            Self::Io => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "file corrupted"),
        }
    }
}
