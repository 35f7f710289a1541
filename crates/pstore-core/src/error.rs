use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Conditions that end a drain run with a non-zero status.
#[derive(Debug, Error)]
pub enum DrainError {
    #[error("mount pstore on {path} failed: {source}")]
    MountFailed { path: PathBuf, source: io::Error },

    #[error("pstore is not mounted on {path}")]
    NotMounted { path: PathBuf },

    #[error("cannot read mount table: {source}")]
    MountTable { source: io::Error },

    #[error("cannot read pstore directory {path}: {source}")]
    SourceUnreadable { path: PathBuf, source: io::Error },

    #[error("remove {path} failed: {source}")]
    DeleteFailed { path: PathBuf, source: io::Error },

    #[error("umount {path} failed: {source}")]
    UnmountFailed { path: PathBuf, source: io::Error },
}

/// Coarse grouping of [`DrainError`], one per exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    Gate,
    Source,
    Delete,
    Unmount,
}

impl DrainError {
    pub fn class(&self) -> FailureClass {
        match self {
            DrainError::MountFailed { .. }
            | DrainError::NotMounted { .. }
            | DrainError::MountTable { .. } => FailureClass::Gate,
            DrainError::SourceUnreadable { .. } => FailureClass::Source,
            DrainError::DeleteFailed { .. } => FailureClass::Delete,
            DrainError::UnmountFailed { .. } => FailureClass::Unmount,
        }
    }
}

/// A single entry that could not be archived. Logged and counted, never fatal.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("open {path} failed: {source}")]
    OpenSource { path: PathBuf, source: io::Error },

    #[error("create {path} failed: {source}")]
    OpenTarget { path: PathBuf, source: io::Error },

    #[error("read {path} failed: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("write {path} failed: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("archive {path} is not open")]
    TargetUnavailable { path: PathBuf },
}
