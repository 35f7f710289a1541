//! Destination side of a drain: dated per-run directories or one aggregate file.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use tracing::{error, warn};

use crate::config::{Layout, DIR_MODE, FILE_MODE};
use crate::copier::{Copier, StreamFault};
use crate::enumerate::SourceEntry;
use crate::error::CopyError;
use crate::fs::PstoreFs;

/// `YYYY-M-D` in UTC, without zero padding.
pub fn run_label(now: DateTime<Utc>) -> String {
    format!("{}-{}-{}", now.year(), now.month(), now.day())
}

/// Result of a bounded suffix search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirSlot {
    /// Nothing exists at this path yet.
    Fresh(PathBuf),
    /// Every candidate was taken; this is the last one tried.
    Exhausted(PathBuf),
}

impl DirSlot {
    pub fn path(&self) -> &Path {
        match self {
            DirSlot::Fresh(p) | DirSlot::Exhausted(p) => p,
        }
    }
}

/// Picks `<root>/<label>-<n>` for the smallest free `n`. The counter only
/// moves forward, so later iterations of the same run resume where the
/// previous search stopped.
#[derive(Debug, Clone)]
pub struct DirAllocator {
    root: PathBuf,
    label: String,
    next: u32,
    max: u32,
}

impl DirAllocator {
    pub fn new(root: impl Into<PathBuf>, label: impl Into<String>, max: u32) -> Self {
        Self {
            root: root.into(),
            label: label.into(),
            next: 0,
            max: max.max(1),
        }
    }

    fn candidate(&self, n: u32) -> PathBuf {
        self.root.join(format!("{}-{}", self.label, n))
    }

    /// Checks at most `max` candidates in total over the allocator's lifetime.
    pub fn next_slot<F: PstoreFs + ?Sized>(&mut self, fs: &F) -> DirSlot {
        loop {
            let candidate = self.candidate(self.next);
            if !fs.exists(&candidate) {
                return DirSlot::Fresh(candidate);
            }
            if self.next + 1 >= self.max {
                return DirSlot::Exhausted(candidate);
            }
            self.next += 1;
        }
    }
}

/// Where the current run writes copied entries.
pub enum ArchiveSink {
    PerEntry {
        root: PathBuf,
        slots: DirAllocator,
        current: Option<PathBuf>,
    },
    Aggregate {
        file: PathBuf,
        writer: Option<Box<dyn Write>>,
    },
}

impl ArchiveSink {
    pub fn new(layout: &Layout, label: &str, max_dir_count: u32) -> Self {
        match layout {
            Layout::PerEntry { root } => ArchiveSink::PerEntry {
                root: root.clone(),
                slots: DirAllocator::new(root.clone(), label, max_dir_count),
                current: None,
            },
            Layout::Aggregate { file } => ArchiveSink::Aggregate {
                file: file.clone(),
                writer: None,
            },
        }
    }

    /// Ensures the directory that will hold archives exists. Failure is only
    /// logged; individual copies will then fail and be counted.
    pub fn prepare<F: PstoreFs + ?Sized>(&self, fs: &F) {
        let dir = match self {
            ArchiveSink::PerEntry { root, .. } => Some(root.as_path()),
            ArchiveSink::Aggregate { file, .. } => file.parent(),
        };
        if let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = fs.create_dir_all(dir) {
                error!("Unable to create {} ({})", dir.display(), e);
            }
        }
    }

    /// Called once per run, after the gate first reports pstore available.
    /// The aggregate file is truncated here even if nothing is drained, so it
    /// never carries a previous run's records.
    pub fn open_run<F: PstoreFs + ?Sized>(&mut self, fs: &F) {
        if let ArchiveSink::Aggregate { file, writer } = self {
            if writer.is_none() {
                match fs.create_file(file, FILE_MODE) {
                    Ok(w) => *writer = Some(w),
                    Err(e) => error!("Open {} error: {}", file.display(), e),
                }
            }
        }
    }

    /// Readies the target for one drain iteration and returns its path.
    pub fn begin_pass<F: PstoreFs + ?Sized>(&mut self, fs: &F) -> PathBuf {
        match self {
            ArchiveSink::PerEntry { slots, current, .. } => {
                let slot = slots.next_slot(fs);
                match &slot {
                    DirSlot::Fresh(dir) => {
                        if let Err(e) = fs.create_dir(dir, DIR_MODE) {
                            error!("Unable to create {} ({})", dir.display(), e);
                        }
                    }
                    DirSlot::Exhausted(dir) => {
                        warn!("no free archive directory left, reusing {}", dir.display());
                    }
                }
                let dir = slot.path().to_path_buf();
                *current = Some(dir.clone());
                dir
            }
            ArchiveSink::Aggregate { file, .. } => file.clone(),
        }
    }

    /// Copies one entry into the current target.
    pub fn copy_entry<F: PstoreFs + ?Sized>(
        &mut self,
        fs: &F,
        copier: &mut Copier,
        entry: &SourceEntry,
    ) -> Result<u64, CopyError> {
        let src_path = entry.path();
        let mut src = fs.open_entry(src_path).map_err(|source| CopyError::OpenSource {
            path: src_path.to_path_buf(),
            source,
        })?;

        match self {
            ArchiveSink::PerEntry { root, current, .. } => {
                let dir = current
                    .as_deref()
                    .ok_or_else(|| CopyError::TargetUnavailable { path: root.clone() })?;
                let target = dir.join(entry.name());
                let mut dst = fs
                    .create_file(&target, FILE_MODE)
                    .map_err(|source| CopyError::OpenTarget {
                        path: target.clone(),
                        source,
                    })?;
                copier
                    .copy(&mut *src, &mut *dst)
                    .map_err(|fault| stream_error(fault, src_path, &target))
            }
            ArchiveSink::Aggregate { file, writer } => {
                let dst = writer
                    .as_mut()
                    .ok_or_else(|| CopyError::TargetUnavailable { path: file.clone() })?;
                copier
                    .copy(&mut *src, &mut **dst)
                    .map_err(|fault| stream_error(fault, src_path, file))
            }
        }
    }

    /// Releases the aggregate writer, if any.
    pub fn close(&mut self) {
        if let ArchiveSink::Aggregate { file, writer } = self {
            if let Some(mut w) = writer.take() {
                if let Err(e) = w.flush() {
                    error!("Write {} error: {}", file.display(), e);
                }
            }
        }
    }
}

fn stream_error(fault: StreamFault, src: &Path, dst: &Path) -> CopyError {
    match fault {
        StreamFault::Read(source) => CopyError::Read {
            path: src.to_path_buf(),
            source,
        },
        StreamFault::Write(source) => CopyError::Write {
            path: dst.to_path_buf(),
            source,
        },
    }
}
