//! Shared entry point for the `pstore-clean` and `pstore-collect` binaries.

pub mod exit_codes;
pub mod logging;

use pstore_core::{DrainConfig, Drainer, HostFs};

/// Drains the host's pstore per `config` and returns the process exit status.
pub fn run(name: &str, config: DrainConfig) -> i32 {
    restrict_umask();

    if let Err(e) = logging::init() {
        eprintln!("{name}: {e:?}");
    }
    let _span = tracing::info_span!("pstore", tool = name).entered();

    match Drainer::new(HostFs, config).run() {
        Ok(_) => exit_codes::SUCCESS,
        Err(e) => exit_codes::for_error(&e),
    }
}

#[cfg(unix)]
fn restrict_umask() {
    use nix::sys::stat::{umask, Mode};
    use pstore_core::config::UMASK;

    umask(Mode::from_bits_truncate(UMASK as nix::libc::mode_t));
}

#[cfg(not(unix))]
fn restrict_umask() {}
