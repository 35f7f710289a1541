#![allow(dead_code)]

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use pstore_core::fs::DirStream;
use pstore_core::{DrainConfig, HostFs, Layout, MountMode, PstoreFs};
use tempfile::TempDir;

pub const LABEL: &str = "2026-10-19";

/// Knobs and counters shared between a test and the fake.
#[derive(Debug, Default)]
pub struct FakeState {
    pub mounted: bool,
    /// What an external mounter left behind; drives the synthetic mount table.
    pub externally_mounted: bool,
    pub mounts: u32,
    pub unmounts: u32,
    pub fail_mount: bool,
    /// Mounts numbered at or above this one fail.
    pub fail_mount_from: Option<u32>,
    pub fail_unmount: bool,
    pub fail_mount_table: bool,
    /// `read_dir` on the source fails, as if the mount point were not a directory.
    pub unreadable_source: bool,
    /// Drop a fresh record into the source on every mount.
    pub refill: bool,
    pub unreadable: HashSet<OsString>,
    pub undeletable: HashSet<OsString>,
    pub opened: Vec<OsString>,
    pub removed: Vec<OsString>,
}

/// Temp-dir backed pstore. Mounting is simulated; all other operations hit
/// the real directories under the temp root.
pub struct FakeFs {
    dir: TempDir,
    host: HostFs,
    state: RefCell<FakeState>,
}

impl FakeFs {
    /// A fake with the source directory already present.
    pub fn new() -> Self {
        let fake = Self::without_source();
        fs::create_dir(fake.source()).unwrap();
        fake
    }

    pub fn without_source() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            host: HostFs,
            state: RefCell::new(FakeState::default()),
        }
    }

    pub fn source(&self) -> PathBuf {
        self.dir.path().join("pstore")
    }

    pub fn archive_root(&self) -> PathBuf {
        self.dir.path().join("archive")
    }

    pub fn archive_file(&self) -> PathBuf {
        self.archive_root().join("pstore.log")
    }

    pub fn add_entry(&self, name: &str, content: &[u8]) {
        fs::write(self.source().join(name), content).unwrap();
    }

    pub fn source_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.source())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    pub fn state(&self) -> Ref<'_, FakeState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }

    pub fn per_entry_config(&self) -> DrainConfig {
        DrainConfig {
            mount_point: self.source(),
            mount: MountMode::Owned,
            layout: Layout::PerEntry {
                root: self.archive_root(),
            },
            ..DrainConfig::per_entry()
        }
    }

    pub fn aggregate_config(&self) -> DrainConfig {
        DrainConfig {
            mount_point: self.source(),
            mount: MountMode::External,
            layout: Layout::Aggregate {
                file: self.archive_file(),
            },
            ..DrainConfig::aggregate()
        }
    }

    fn injected(msg: &str) -> io::Error {
        io::Error::other(msg.to_string())
    }
}

struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("Input/output error"))
    }
}

impl PstoreFs for FakeFs {
    fn mount_pstore(&self, _target: &Path) -> io::Result<()> {
        let mut st = self.state.borrow_mut();
        st.mounts += 1;
        if st.fail_mount || st.fail_mount_from.is_some_and(|n| st.mounts >= n) {
            return Err(Self::injected("No such device"));
        }
        st.mounted = true;
        if st.refill {
            let name = format!("dmesg-ramoops-{}", st.mounts);
            fs::write(self.source().join(name), b"refilled").unwrap();
        }
        Ok(())
    }

    fn unmount(&self, _target: &Path) -> io::Result<()> {
        let mut st = self.state.borrow_mut();
        st.unmounts += 1;
        if st.fail_unmount {
            return Err(Self::injected("Device or resource busy"));
        }
        st.mounted = false;
        st.externally_mounted = false;
        Ok(())
    }

    fn mount_table(&self) -> io::Result<String> {
        let st = self.state.borrow();
        if st.fail_mount_table {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let mut table = String::from("sysfs /sys sysfs rw,relatime 0 0\n");
        if st.externally_mounted {
            let escaped = self.source().display().to_string().replace(' ', "\\040");
            table.push_str(&format!("pstore {escaped} pstore rw,relatime 0 0\n"));
        }
        Ok(table)
    }

    fn create_dir(&self, path: &Path, mode: u32) -> io::Result<()> {
        self.host.create_dir(path, mode)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.host.create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.host.remove_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.host.exists(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<DirStream<'_>> {
        if self.state.borrow().unreadable_source && path == self.source() {
            return Err(io::Error::from_raw_os_error(20));
        }
        self.host.read_dir(path)
    }

    fn open_entry(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        let name = path.file_name().unwrap().to_os_string();
        let mut st = self.state.borrow_mut();
        st.opened.push(name.clone());
        if st.unreadable.contains(&name) {
            return Ok(Box::new(BrokenReader));
        }
        self.host.open_entry(path)
    }

    fn create_file(&self, path: &Path, mode: u32) -> io::Result<Box<dyn Write>> {
        self.host.create_file(path, mode)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let name = path.file_name().unwrap().to_os_string();
        if self.state.borrow().undeletable.contains(&name) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        self.host.remove_file(path)?;
        self.state.borrow_mut().removed.push(name);
        Ok(())
    }
}
