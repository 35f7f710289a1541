use std::path::Path;

use crate::enumerate::is_pseudo_entry;
use crate::error::DrainError;
use crate::fs::PstoreFs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Empty,
    NotEmpty,
}

/// Checks whether `dir` holds at least one drainable entry, stopping at the
/// first one found.
pub fn probe<F: PstoreFs + ?Sized>(fs: &F, dir: &Path) -> Result<Probe, DrainError> {
    let unreadable = |source| DrainError::SourceUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    for name in fs.read_dir(dir).map_err(unreadable)? {
        if !is_pseudo_entry(&name.map_err(unreadable)?) {
            return Ok(Probe::NotEmpty);
        }
    }
    Ok(Probe::Empty)
}
