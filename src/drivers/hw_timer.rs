//! Periodic timer backend.
//!
//! On ESP-IDF the callback runs on the esp_timer task through
//! `EspTaskTimerService` (task dispatch, not ISR), so it may take the
//! critical-section mutexes guarding the peripheral tables.  On simulation
//! targets a dedicated thread approximates the same schedule with a
//! drift-free deadline loop.
//!
//! Dropping a [`PeriodicTimer`] stops it.

use core::fmt;
use core::time::Duration;

#[cfg(target_os = "espidf")]
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

#[cfg(not(target_os = "espidf"))]
use std::sync::Arc;
#[cfg(not(target_os = "espidf"))]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(not(target_os = "espidf"))]
use std::thread::{self, JoinHandle};
#[cfg(not(target_os = "espidf"))]
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The platform timer could not be created (ESP error code).
    CreateFailed(i32),
    /// The timer was created but refused to start (ESP error code).
    StartFailed(i32),
    /// Host only: the driver thread could not be spawned.
    SpawnFailed,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateFailed(rc) => write!(f, "timer create failed (rc={})", rc),
            Self::StartFailed(rc) => write!(f, "timer start failed (rc={})", rc),
            Self::SpawnFailed => write!(f, "timer thread spawn failed"),
        }
    }
}

impl std::error::Error for TimerError {}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct PeriodicTimer {
    timer: Option<EspTimer<'static>>,
    _service: EspTaskTimerService,
}

#[cfg(target_os = "espidf")]
impl PeriodicTimer {
    /// Start calling `callback` every `period`, first firing one period from now.
    pub fn start<F>(_name: &str, period: Duration, callback: F) -> Result<Self, TimerError>
    where
        F: FnMut() + Send + 'static,
    {
        let service =
            EspTaskTimerService::new().map_err(|e| TimerError::CreateFailed(e.code()))?;
        let timer = service
            .timer(callback)
            .map_err(|e| TimerError::CreateFailed(e.code()))?;
        timer
            .every(period)
            .map_err(|e| TimerError::StartFailed(e.code()))?;
        Ok(Self {
            timer: Some(timer),
            _service: service,
        })
    }

    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            if let Err(e) = timer.cancel() {
                log::warn!("hw_timer: cancel failed ({})", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct PeriodicTimer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

#[cfg(not(target_os = "espidf"))]
impl PeriodicTimer {
    /// Start calling `callback` every `period`, first firing one period from now.
    pub fn start<F>(name: &str, period: Duration, mut callback: F) -> Result<Self, TimerError>
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                let mut deadline = Instant::now() + period;
                loop {
                    // Sleep until the deadline; stop() unparks us early.
                    loop {
                        if stop_flag.load(Ordering::Acquire) {
                            return;
                        }
                        let now = Instant::now();
                        if now >= deadline {
                            break;
                        }
                        thread::park_timeout(deadline - now);
                    }
                    callback();
                    deadline += period;
                }
            })
            .map_err(|_| TimerError::SpawnFailed)?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stop the driver and wait for an in-flight callback to finish.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::Release);
            handle.thread().unpark();
            if handle.join().is_err() {
                log::warn!("hw_timer(sim): timer thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
