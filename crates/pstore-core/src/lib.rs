//! Boot-time drain for the kernel pstore pseudo-filesystem.
//!
//! Crash records exposed under pstore live in a small NVRAM region; once it
//! fills, the kernel silently drops new records. This crate copies every
//! entry into durable storage and deletes it from pstore, looping until the
//! source is empty or the iteration budget runs out.
//!
//! Two layouts are supported:
//! - per-entry: each run mounts pstore itself and writes one file per entry
//!   into a fresh `<archive root>/<YYYY-M-D>-<n>` directory;
//! - aggregate: pstore is mounted by someone else and all entries are
//!   concatenated, newest name first, into one fixed file.

pub mod archive;
pub mod config;
pub mod copier;
pub mod driver;
pub mod enumerate;
pub mod error;
pub mod fs;
pub mod gate;
pub mod probe;

pub use config::{DrainConfig, Layout, MountMode};
pub use driver::{DrainReport, Drainer, Settle};
pub use enumerate::{EntryOrder, SourceEntry};
pub use error::{CopyError, DrainError, FailureClass};
pub use fs::{HostFs, PstoreFs};
