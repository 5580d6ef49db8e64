//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                         |
//! |------------|--------------|-------------------------------------|
//! | `gpio`     | GpioPort     | ESP32 GPIO pads / simulated levels  |
//! | `flash_fs` | StoragePort  | FAT `storage` partition / host dir  |

pub mod flash_fs;
pub mod gpio;
