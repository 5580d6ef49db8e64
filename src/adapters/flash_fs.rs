//! Flash filesystem adapter.
//!
//! Implements [`StoragePort`] over `std::fs`.  On ESP-IDF the `storage`
//! partition is a wear-levelled FAT volume mounted at [`MOUNT_POINT`] for
//! the duration of each load or persist; everywhere else a plain host
//! directory stands in for the partition.
//!
//! Writes are flushed with `sync_all` before returning, so a completed
//! `write` survives power loss.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use log::{debug, warn};

use crate::app::ports::{StorageError, StoragePort};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// VFS path the partition is mounted on.
pub const MOUNT_POINT: &str = "/config";

#[cfg(target_os = "espidf")]
const MOUNT_POINT_C: &core::ffi::CStr = c"/config";
#[cfg(target_os = "espidf")]
const PARTITION_LABEL_C: &core::ffi::CStr = c"storage";

pub struct FlashFs {
    root: PathBuf,
    mounted: bool,
    #[cfg(target_os = "espidf")]
    wl_handle: wl_handle_t,
}

impl FlashFs {
    /// The on-board `storage` partition.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {
            root: PathBuf::from(MOUNT_POINT),
            mounted: false,
            wl_handle: WL_INVALID_HANDLE,
        }
    }

    /// A host directory acting as the partition.  Created on mount.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn path(&self, name: &str) -> Result<PathBuf, StorageError> {
        if self.mounted {
            Ok(self.root.join(name))
        } else {
            Err(StorageError::MountFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn mount_volume(&mut self) -> Result<(), StorageError> {
        let cfg = esp_vfs_fat_mount_config_t {
            format_if_mount_failed: true,
            max_files: 3,
            allocation_unit_size: CONFIG_WL_SECTOR_SIZE as usize,
            ..Default::default()
        };
        // SAFETY: both C strings are 'static, `cfg` outlives the call, and
        // the handle is only touched from the task that owns this adapter.
        let rc = unsafe {
            esp_vfs_fat_spiflash_mount_rw_wl(
                MOUNT_POINT_C.as_ptr(),
                PARTITION_LABEL_C.as_ptr(),
                &cfg,
                &mut self.wl_handle,
            )
        };
        if rc != ESP_OK as i32 {
            warn!("flash_fs: mount failed (rc={})", rc);
            return Err(StorageError::MountFailed);
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn mount_volume(&mut self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            warn!("flash_fs(sim): cannot create {}: {}", self.root.display(), e);
            StorageError::MountFailed
        })
    }

    #[cfg(target_os = "espidf")]
    fn unmount_volume(&mut self) {
        // SAFETY: wl_handle came from a successful mount of MOUNT_POINT_C.
        let rc = unsafe { esp_vfs_fat_spiflash_unmount_rw_wl(MOUNT_POINT_C.as_ptr(), self.wl_handle) };
        if rc != ESP_OK as i32 {
            warn!("flash_fs: unmount failed (rc={})", rc);
        }
        self.wl_handle = WL_INVALID_HANDLE;
    }

    #[cfg(not(target_os = "espidf"))]
    fn unmount_volume(&mut self) {}
}

#[cfg(target_os = "espidf")]
impl Default for FlashFs {
    fn default() -> Self {
        Self::new()
    }
}

fn map_io(e: &io::Error) -> StorageError {
    if e.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound
    } else {
        StorageError::Io
    }
}

impl StoragePort for FlashFs {
    fn mount(&mut self) -> Result<(), StorageError> {
        if self.mounted {
            return Ok(());
        }
        self.mount_volume()?;
        self.mounted = true;
        debug!("flash_fs: mounted {}", self.root.display());
        Ok(())
    }

    fn unmount(&mut self) {
        if self.mounted {
            self.unmount_volume();
            self.mounted = false;
            debug!("flash_fs: unmounted");
        }
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.path(name)?).map_err(|e| map_io(&e))
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path(name)?;
        let mut file = File::create(&path).map_err(|e| map_io(&e))?;
        file.write_all(data).map_err(|e| map_io(&e))?;
        file.sync_all().map_err(|e| map_io(&e))
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_ok_and(|p| p.is_file())
    }

    fn remove(&mut self, name: &str) -> Result<(), StorageError> {
        fs::remove_file(self.path(name)?).map_err(|e| map_io(&e))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        fs::rename(self.path(from)?, self.path(to)?).map_err(|e| map_io(&e))
    }
}
