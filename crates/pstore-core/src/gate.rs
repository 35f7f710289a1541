//! Mount/availability gate and its teardown.
//!
//! An owned gate mounts pstore itself at the start of every iteration and
//! unmounts at the end of it. An external gate never mounts; it only checks
//! the live mount table, and releases the mount at teardown if the table
//! still lists it.

use std::ffi::OsStr;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use tracing::{debug, error, warn};

use crate::config::{MountMode, DIR_MODE};
use crate::error::DrainError;
use crate::fs::PstoreFs;

pub struct MountGate<'a, F: ?Sized> {
    fs: &'a F,
    mount_point: &'a Path,
    mode: MountMode,
    created_dir: bool,
    mounted: bool,
}

impl<'a, F: PstoreFs + ?Sized> MountGate<'a, F> {
    pub fn new(fs: &'a F, mount_point: &'a Path, mode: MountMode) -> Self {
        Self {
            fs,
            mount_point,
            mode,
            created_dir: false,
            mounted: false,
        }
    }

    /// Creates the mount point for an owned gate. An existing directory is
    /// left alone and will not be removed at teardown.
    pub fn prepare(&mut self) {
        if self.mode != MountMode::Owned {
            return;
        }
        match self.fs.create_dir(self.mount_point, DIR_MODE) {
            Ok(()) => self.created_dir = true,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => warn!(
                "Unable to create {} ({})",
                self.mount_point.display(),
                e
            ),
        }
    }

    pub fn ensure_available(&mut self) -> Result<(), DrainError> {
        match self.mode {
            MountMode::Owned => {
                self.fs.mount_pstore(self.mount_point).map_err(|source| {
                    error!("Mount pstore failed ({})", source);
                    DrainError::MountFailed {
                        path: self.mount_point.to_path_buf(),
                        source,
                    }
                })?;
            }
            MountMode::External => {
                let table = self.fs.mount_table().map_err(|source| {
                    error!("Unable to read mount table ({})", source);
                    DrainError::MountTable { source }
                })?;
                if !is_listed(&table, self.mount_point) {
                    error!("{} is not mounted", self.mount_point.display());
                    return Err(DrainError::NotMounted {
                        path: self.mount_point.to_path_buf(),
                    });
                }
            }
        }
        self.mounted = true;
        Ok(())
    }

    /// Closes one iteration. An owned mount is released here and a failure
    /// to do so is fatal; the mount stays recorded so teardown retries it.
    pub fn end_pass(&mut self) -> Result<(), DrainError> {
        if self.mode != MountMode::Owned || !self.mounted {
            return Ok(());
        }
        self.fs.unmount(self.mount_point).map_err(|source| {
            error!("Umount {} failed ({})", self.mount_point.display(), source);
            DrainError::UnmountFailed {
                path: self.mount_point.to_path_buf(),
                source,
            }
        })?;
        self.mounted = false;
        Ok(())
    }

    /// Best-effort release on every exit path. Errors are logged only.
    pub fn teardown(&mut self) {
        if self.mounted {
            let still_listed = match self.mode {
                MountMode::Owned => true,
                MountMode::External => match self.fs.mount_table() {
                    Ok(table) => is_listed(&table, self.mount_point),
                    Err(e) => {
                        warn!("Unable to read mount table ({})", e);
                        true
                    }
                },
            };
            if still_listed {
                match self.fs.unmount(self.mount_point) {
                    Ok(()) => debug!("unmounted {}", self.mount_point.display()),
                    Err(e) => error!("Umount {} failed ({})", self.mount_point.display(), e),
                }
            }
            self.mounted = false;
        }

        if self.created_dir {
            if let Err(e) = self.fs.remove_dir(self.mount_point) {
                error!("Remove dir {} failed ({})", self.mount_point.display(), e);
            }
            self.created_dir = false;
        }
    }
}

/// True if some line of a `/proc/mounts` style table has `mount_point` as its
/// second field.
pub fn is_listed(table: &str, mount_point: &Path) -> bool {
    table.lines().any(|line| {
        line.split_whitespace()
            .nth(1)
            .map(|field| Path::new(OsStr::from_bytes(&unescape_field(field))) == mount_point)
            .unwrap_or(false)
    })
}

/// Decodes the `\ooo` octal escapes the kernel uses for whitespace and
/// backslashes in mount table fields.
fn unescape_field(field: &str) -> Vec<u8> {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() && is_octal_triplet(&bytes[i + 1..i + 4]) {
            let v = bytes[i + 1..i + 4]
                .iter()
                .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
            if let Ok(b) = u8::try_from(v) {
                out.push(b);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn is_octal_triplet(digits: &[u8]) -> bool {
    digits.len() == 3 && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}
