// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.
use std::io::Write;

use crate::{
    FINISHED_MARKER, FlashError,
    types::{DeviceNaming, FlashReport, FlashRunResult, FlashState, PartitionSpec},
    writer::RawWriter,
};

/// Writes a [`PartitionSpec`] to the flash, strictly in order.
pub struct Flasher<W: RawWriter> {
    writer: W,
    naming: DeviceNaming,
    state: FlashState,
    verbose: bool,
}

impl<W: RawWriter> Flasher<W> {
    pub fn new(writer: W, naming: DeviceNaming) -> Self {
        Self {
            writer,
            naming,
            state: FlashState::Pending,
            verbose: false,
        }
    }

    /// Also log the writer's command line for every partition
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn state(&self) -> FlashState {
        self.state
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Flash every entry of `spec`, announcing each one on `log` beforehand.
    ///
    /// The first failed write aborts the run: nothing after it is attempted and
    /// nothing before it is rolled back. On success, [`FINISHED_MARKER`] is
    /// written to `log`. Running again with the same spec simply rewrites it.
    pub fn flash_all(&mut self, spec: &PartitionSpec, log: &mut impl Write) -> FlashRunResult {
        self.state = FlashState::Pending;

        for (position, entry) in spec.entries().iter().enumerate() {
            self.state = FlashState::Running(position);
            let device = self.naming.resolve(entry.index);

            writeln!(log, "Flashing {} to {}", entry.path.display(), device.display())?;
            if self.verbose {
                if let Some(cmd) = self.writer.describe(&entry.path, &device) {
                    writeln!(log, "+ {cmd}")?;
                }
            }
            log.flush()?;

            if let Err(status) = self.writer.write(&entry.path, &device) {
                self.state = FlashState::Failed(position);
                return Err(FlashError::WriteFailure {
                    position,
                    index: entry.index,
                    device,
                    path: entry.path.clone(),
                    status,
                });
            }
        }

        self.state = FlashState::Succeeded;
        writeln!(log, "{FINISHED_MARKER}")?;

        Ok(FlashReport {
            written: spec.len(),
        })
    }
}
