//! Fixed paths and limits, bundled into the two deployment presets.

use std::path::PathBuf;

use crate::enumerate::EntryOrder;

/// Mount point owned by the per-entry variant.
pub const PSTORE_MOUNT_POINT: &str = "/dev/pstore";
/// Where an externally managed pstore is expected to be mounted.
pub const EXTERNAL_MOUNT_POINT: &str = "/sys/fs/pstore";
/// Parent of the per-run archive directories.
pub const ARCHIVE_ROOT: &str = "/data/kpanic/pstore";
/// Single destination file of the aggregate variant.
pub const AGGREGATE_ARCHIVE: &str = "/data/kpanic/pstore.log";

/// Filesystem type and mount source passed to mount(2).
pub const PSTORE_FSTYPE: &str = "pstore";
/// Live mount table consulted by the external gate.
pub const MOUNT_TABLE: &str = "/proc/mounts";

pub const BUFFER_SIZE: usize = 4096;
/// Upper bound on `<date>-<n>` suffixes tried for one run.
pub const MAX_DIR_COUNT: u32 = 1024;
/// Upper bound on gate/probe/drain iterations for one run.
pub const MAX_COUNT: u32 = 1024;

pub const DIR_MODE: u32 = 0o755;
pub const FILE_MODE: u32 = 0o640;
pub const UMASK: u32 = 0o027;

/// Who is responsible for the pstore mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountMode {
    /// Create the mount point, mount before and unmount after every iteration.
    Owned,
    /// Expect an existing mount, verified against the live mount table.
    External,
}

/// Shape of the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// One directory per iteration under `root`, one file per entry.
    PerEntry { root: PathBuf },
    /// Every entry appended to `file`, truncated once per run.
    Aggregate { file: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainConfig {
    pub mount_point: PathBuf,
    pub mount: MountMode,
    pub layout: Layout,
    pub order: EntryOrder,
    pub buffer_size: usize,
    pub max_iterations: u32,
    pub max_dir_count: u32,
}

impl DrainConfig {
    /// Self-mounting, one file per entry in a dated directory.
    pub fn per_entry() -> Self {
        Self {
            mount_point: PathBuf::from(PSTORE_MOUNT_POINT),
            mount: MountMode::Owned,
            layout: Layout::PerEntry {
                root: PathBuf::from(ARCHIVE_ROOT),
            },
            order: EntryOrder::Natural,
            buffer_size: BUFFER_SIZE,
            max_iterations: MAX_COUNT,
            max_dir_count: MAX_DIR_COUNT,
        }
    }

    /// Externally mounted, newest entry first into a single file.
    pub fn aggregate() -> Self {
        Self {
            mount_point: PathBuf::from(EXTERNAL_MOUNT_POINT),
            mount: MountMode::External,
            layout: Layout::Aggregate {
                file: PathBuf::from(AGGREGATE_ARCHIVE),
            },
            order: EntryOrder::Descending,
            ..Self::per_entry()
        }
    }
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self::per_entry()
    }
}
