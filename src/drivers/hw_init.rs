//! One-shot GPIO initialization and raw pad access.
//!
//! Configures every pin in [`pins`] using raw ESP-IDF sys calls.  Called
//! once from `main()` before the tick scheduler starts.
//!
//! On host builds the pads are simulated by one atomic bitmask so tests and
//! the fuzzer can drive inputs with [`sim_set_level`].

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed { gpio: i32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed { gpio, rc } => {
                write!(f, "GPIO{} config failed (rc={})", gpio, rc)
            }
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the tick timer exists.
    unsafe {
        init_gpio_outputs()?;
        init_gpio_inputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn configure(gpio: i32, mode: gpio_mode_t, pull_up: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << gpio,
        mode,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        ..Default::default()
    };
    let rc = unsafe { gpio_config(&cfg) };
    if rc != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed { gpio, rc });
    }
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    for &pin in &pins::ACTUATOR_GPIOS {
        unsafe {
            configure(pin, gpio_mode_t_GPIO_MODE_OUTPUT, false)?;
            gpio_set_level(pin as gpio_num_t, 0);
        }
    }
    info!("hw_init: {} actuator outputs configured, all low", pins::MAX_ACTUATORS);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level is a single register write on a pin configured
    // as output in init_gpio_outputs(); callers serialize per actuator table.
    unsafe {
        gpio_set_level(pin as gpio_num_t, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    sim_set_level(pin, high);
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for &pin in pins::SENSOR_GPIOS.iter().chain(&pins::COUNTER_GPIOS) {
        unsafe { configure(pin, gpio_mode_t_GPIO_MODE_INPUT, true)? };
    }
    // Input-only pad without internal pulls; the board fits the resistor.
    unsafe { configure(pins::FACTORY_RESET_GPIO, gpio_mode_t_GPIO_MODE_INPUT, false)? };

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access.
    (unsafe { gpio_get_level(pin as gpio_num_t) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    SIM_LEVELS.load(Ordering::Relaxed) & bit(pin) != 0
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: AtomicU64 = AtomicU64::new(idle_levels());

/// Pulled-up inputs high, actuators off, factory override released.
#[cfg(not(target_os = "espidf"))]
const fn idle_levels() -> u64 {
    let mut levels = !(1u64 << pins::FACTORY_RESET_GPIO);
    let mut i = 0;
    while i < pins::MAX_ACTUATORS {
        levels &= !(1u64 << pins::ACTUATOR_GPIOS[i]);
        i += 1;
    }
    levels
}

#[cfg(not(target_os = "espidf"))]
fn bit(pin: i32) -> u64 {
    1u64.checked_shl(pin as u32).unwrap_or(0)
}

/// Force the simulated level of `pin`.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    if high {
        SIM_LEVELS.fetch_or(bit(pin), Ordering::Relaxed);
    } else {
        SIM_LEVELS.fetch_and(!bit(pin), Ordering::Relaxed);
    }
}
