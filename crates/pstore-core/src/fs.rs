//! Filesystem seam used by every drain component.
//!
//! [`HostFs`] talks to the real kernel. Tests substitute their own
//! implementation to simulate mounts and inject I/O faults.

use std::ffi::OsString;
use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use crate::config::{DIR_MODE, MOUNT_TABLE};

/// Names yielded by [`PstoreFs::read_dir`], in whatever order the backend produces.
pub type DirStream<'a> = Box<dyn Iterator<Item = io::Result<OsString>> + 'a>;

pub trait PstoreFs {
    /// Mount a pstore instance on `target`.
    fn mount_pstore(&self, target: &Path) -> io::Result<()>;

    fn unmount(&self, target: &Path) -> io::Result<()>;

    /// Raw contents of the live mount table, in `/proc/mounts` format.
    fn mount_table(&self) -> io::Result<String>;

    /// Create a single directory with `mode`. Fails with `AlreadyExists` if present.
    fn create_dir(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// `mkdir -p`.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn read_dir(&self, path: &Path) -> io::Result<DirStream<'_>>;

    fn open_entry(&self, path: &Path) -> io::Result<Box<dyn Read>>;

    /// Create or truncate `path` for writing with `mode`.
    fn create_file(&self, path: &Path, mode: u32) -> io::Result<Box<dyn Write>>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// The running system's filesystem and mount table.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl PstoreFs for HostFs {
    #[cfg(target_os = "linux")]
    fn mount_pstore(&self, target: &Path) -> io::Result<()> {
        use crate::config::PSTORE_FSTYPE;
        use nix::mount::{mount, MsFlags};

        mount(
            Some(PSTORE_FSTYPE),
            target,
            Some(PSTORE_FSTYPE),
            MsFlags::empty(),
            None::<&str>,
        )?;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn mount_pstore(&self, _target: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "pstore is only available on Linux",
        ))
    }

    #[cfg(target_os = "linux")]
    fn unmount(&self, target: &Path) -> io::Result<()> {
        nix::mount::umount(target)?;
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn unmount(&self, _target: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "pstore is only available on Linux",
        ))
    }

    fn mount_table(&self) -> io::Result<String> {
        fs::read_to_string(MOUNT_TABLE)
    }

    fn create_dir(&self, path: &Path, mode: u32) -> io::Result<()> {
        DirBuilder::new().mode(mode).create(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        DirBuilder::new().recursive(true).mode(DIR_MODE).create(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn read_dir(&self, path: &Path) -> io::Result<DirStream<'_>> {
        let entries = fs::read_dir(path)?.map(|entry| entry.map(|e| e.file_name()));
        Ok(Box::new(entries))
    }

    fn open_entry(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(path)?))
    }

    fn create_file(&self, path: &Path, mode: u32) -> io::Result<Box<dyn Write>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)?;
        Ok(Box::new(file))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    #[test]
    fn create_dir_reports_existing_directory() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("pstore");

        HostFs.create_dir(&dir, 0o755).unwrap();
        let err = HostFs.create_dir(&dir, 0o755).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(HostFs.exists(&dir));
    }

    #[test]
    fn create_file_truncates_and_applies_mode() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("dmesg-ramoops-0");
        fs::write(&path, b"stale contents that are longer").unwrap();

        {
            let mut w = HostFs.create_file(&path, 0o600).unwrap();
            w.write_all(b"fresh").unwrap();
        }

        assert_eq!(fs::read(&path).unwrap(), b"fresh");
        // Mode only applies on creation; the pre-existing file keeps its bits.
        let fresh = tmp.path().join("console-ramoops-0");
        drop(HostFs.create_file(&fresh, 0o600).unwrap());
        let mode = fs::metadata(&fresh).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & !0o600, 0);
    }

    #[test]
    fn read_dir_yields_plain_names() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        fs::write(tmp.path().join("b"), b"").unwrap();

        let mut names: Vec<OsString> = HostFs
            .read_dir(tmp.path())
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();
        names.sort();
        assert_eq!(names, vec![OsString::from("a"), OsString::from("b")]);
    }
}
