//! Gatehouse Firmware Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                    │
//! │        EspGpio (GpioPort)      FlashFs (StoragePort)      │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │ AppService: ConfigStore · PeripheralHub            │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │  TickScheduler (esp_timer task, 100 ms)                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The network request layer attaches to the [`AppService`] built here.
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};

use gatehouse::adapters::flash_fs::FlashFs;
use gatehouse::adapters::gpio::EspGpio;
use gatehouse::app::service::AppService;
use gatehouse::drivers::hw_init;
use gatehouse::scheduler::TickScheduler;

/// How often the supervisor loop retries a persist that failed earlier.
const PERSIST_RETRY: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Gatehouse v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Pads ───────────────────────────────────────────────
    hw_init::init_peripherals().context("GPIO init")?;

    // ── 3. Service + configuration ────────────────────────────
    let mut service = AppService::new(EspGpio::new(), FlashFs::new());
    let source = service.load_config();
    info!(
        "Config from {}: ssid='{}' host='{}' mode={}",
        source,
        service.ssid(),
        service.hostname(),
        service.wifi_mode()
    );

    // ── 4. Tick scheduler ─────────────────────────────────────
    let mut scheduler = TickScheduler::new();
    scheduler.start(service.hub()).context("tick scheduler")?;

    info!("{}", service.get_status().trim_end());
    info!("System ready.");

    // ── 5. Supervisor loop ────────────────────────────────────
    loop {
        std::thread::sleep(PERSIST_RETRY);

        if service.is_config_dirty() {
            match service.persist_config() {
                Ok(outcome) => info!("Deferred persist: {:?}", outcome),
                Err(e) => warn!("Deferred persist failed: {}", e),
            }
        }

        if !scheduler.is_running() {
            error!("Tick scheduler stopped; restarting");
            if let Err(e) = scheduler.start(service.hub()) {
                error!("Tick scheduler restart failed: {}", e);
            }
        }
    }
}
