//! Listing of drainable pstore entries.

use std::cmp::Ordering;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::DrainError;
use crate::fs::PstoreFs;

/// Order in which one iteration's entries are archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryOrder {
    /// Whatever the directory stream yields.
    #[default]
    Natural,
    Ascending,
    /// Highest name first. With the kernel's `<kind>-<backend>-<n>` naming
    /// this puts the most recent dump chunk at the head of the archive.
    Descending,
}

impl EntryOrder {
    pub fn apply(self, entries: &mut [SourceEntry]) {
        match self {
            EntryOrder::Natural => {}
            EntryOrder::Ascending => entries.sort_by(SourceEntry::cmp_name),
            EntryOrder::Descending => entries.sort_by(|a, b| b.cmp_name(a)),
        }
    }
}

/// One record file inside the pstore root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    name: OsString,
    path: PathBuf,
}

impl SourceEntry {
    pub fn new(dir: &Path, name: OsString) -> Self {
        let path = dir.join(&name);
        Self { name, path }
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cmp_name(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

/// `.` and `..` never count as entries, whatever the backend reports.
pub fn is_pseudo_entry(name: &OsStr) -> bool {
    name == "." || name == ".."
}

/// Materializes every entry of `dir` in `order`. The directory stream is
/// closed before this returns.
pub fn list_entries<F: PstoreFs + ?Sized>(
    fs: &F,
    dir: &Path,
    order: EntryOrder,
) -> Result<Vec<SourceEntry>, DrainError> {
    let unreadable = |source| DrainError::SourceUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for name in fs.read_dir(dir).map_err(unreadable)? {
        let name = name.map_err(unreadable)?;
        if is_pseudo_entry(&name) {
            continue;
        }
        entries.push(SourceEntry::new(dir, name));
    }

    order.apply(&mut entries);
    Ok(entries)
}
