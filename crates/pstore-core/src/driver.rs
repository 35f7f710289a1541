//! The drain state machine.
//!
//! ```text
//! Idle -> Gating -> Probing -> { Draining | Settled } -> Teardown -> { Done | Failed }
//!            ^                       |
//!            +-----------------------+   (at most `max_iterations` times)
//! ```
//!
//! Copy failures are counted and the entry is deleted anyway, so a broken
//! record cannot pin NVRAM forever. A failed delete ends the run: the same
//! entry would reappear on the next probe. Teardown runs on every path once
//! the gate has been prepared.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::archive::{run_label, ArchiveSink};
use crate::config::DrainConfig;
use crate::copier::Copier;
use crate::enumerate::list_entries;
use crate::error::DrainError;
use crate::fs::PstoreFs;
use crate::gate::MountGate;
use crate::probe::{probe, Probe};

/// Why the loop stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Settle {
    /// The probe found nothing left to drain.
    #[default]
    Clean,
    /// `max_iterations` passes ran and the source still refilled.
    IterationLimit,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub iterations: u32,
    /// Entries removed from pstore.
    pub drained: usize,
    /// Entries whose content reached the archive.
    pub copied: usize,
    pub copy_failures: usize,
    pub bytes: u64,
    /// Targets written during the run, one per iteration for the per-entry layout.
    pub archives: Vec<PathBuf>,
    pub settle: Settle,
}

pub struct Drainer<F> {
    fs: F,
    config: DrainConfig,
    label: String,
}

impl<F: PstoreFs> Drainer<F> {
    /// Dates the run's archive directories with the current UTC day.
    pub fn new(fs: F, config: DrainConfig) -> Self {
        Self {
            fs,
            config,
            label: run_label(Utc::now()),
        }
    }

    pub fn with_run_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn run(&self) -> Result<DrainReport, DrainError> {
        let cfg = &self.config;
        let mut gate = MountGate::new(&self.fs, &cfg.mount_point, cfg.mount);
        let mut sink = ArchiveSink::new(&cfg.layout, &self.label, cfg.max_dir_count);
        let mut report = DrainReport::default();

        gate.prepare();
        sink.prepare(&self.fs);

        let outcome = self.drain(&mut gate, &mut sink, &mut report);

        sink.close();
        gate.teardown();

        match outcome {
            Ok(settle) => {
                report.settle = settle;
                info!(
                    iterations = report.iterations,
                    drained = report.drained,
                    copy_failures = report.copy_failures,
                    "pstore drain finished"
                );
                Ok(report)
            }
            Err(e) => {
                error!("Clean pstore failed: {}", e);
                Err(e)
            }
        }
    }

    fn drain(
        &self,
        gate: &mut MountGate<'_, F>,
        sink: &mut ArchiveSink,
        report: &mut DrainReport,
    ) -> Result<Settle, DrainError> {
        let cfg = &self.config;
        let mut copier = Copier::new(cfg.buffer_size);

        for iteration in 1..=cfg.max_iterations {
            report.iterations = iteration;
            gate.ensure_available()?;
            if iteration == 1 {
                sink.open_run(&self.fs);
            }

            if probe(&self.fs, &cfg.mount_point)? == Probe::Empty {
                info!("Pstore is clean.");
                return Ok(Settle::Clean);
            }

            let entries = list_entries(&self.fs, &cfg.mount_point, cfg.order)?;
            let target = sink.begin_pass(&self.fs);
            warn!(
                iteration,
                entries = entries.len(),
                "Kernel pstore crash dump found, copying to {}",
                target.display()
            );
            report.archives.push(target);

            for entry in &entries {
                match sink.copy_entry(&self.fs, &mut copier, entry) {
                    Ok(n) => {
                        report.copied += 1;
                        report.bytes += n;
                    }
                    Err(e) => {
                        error!("Copy file {} failed ({})", entry.path().display(), e);
                        report.copy_failures += 1;
                    }
                }

                self.fs.remove_file(entry.path()).map_err(|source| {
                    error!("Remove {} failed ({})", entry.path().display(), source);
                    DrainError::DeleteFailed {
                        path: entry.path().to_path_buf(),
                        source,
                    }
                })?;
                report.drained += 1;
            }

            gate.end_pass()?;
        }

        warn!(
            "pstore still not empty after {} iterations, giving up",
            cfg.max_iterations
        );
        Ok(Settle::IterationLimit)
    }
}
