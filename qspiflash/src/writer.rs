// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Stdio},
};

use itertools::Itertools;

use crate::types::WriteStatus;

/// Something that can copy an image file onto a raw flash device
pub trait RawWriter {
    fn write(&mut self, file: &Path, device: &Path) -> Result<(), WriteStatus>;

    /// Human readable form of what `write` would run, if there's anything to show
    fn describe(&self, _file: &Path, _device: &Path) -> Option<String> {
        None
    }
}

impl<T: RawWriter + ?Sized> RawWriter for &mut T {
    fn write(&mut self, file: &Path, device: &Path) -> Result<(), WriteStatus> {
        (**self).write(file, device)
    }

    fn describe(&self, file: &Path, device: &Path) -> Option<String> {
        (**self).describe(file, device)
    }
}

impl<T: RawWriter + ?Sized> RawWriter for Box<T> {
    fn write(&mut self, file: &Path, device: &Path) -> Result<(), WriteStatus> {
        (**self).write(file, device)
    }

    fn describe(&self, file: &Path, device: &Path) -> Option<String> {
        (**self).describe(file, device)
    }
}

pub const DEFAULT_WRITER: &str = "flashcp";
pub const DEFAULT_WRITER_ARGS: [&str; 3] = ["-v", FILE_PLACEHOLDER, DEVICE_PLACEHOLDER];
pub const FILE_PLACEHOLDER: &str = "{file}";
pub const DEVICE_PLACEHOLDER: &str = "{device}";

/// Runs an external program once per partition, e.g. `flashcp -v <file> <device>`.
/// The child inherits stdout/stderr so its own diagnostics reach the operator.
#[derive(Debug, Clone)]
pub struct CommandWriter {
    program: OsString,
    args: Vec<String>,
}

impl Default for CommandWriter {
    fn default() -> Self {
        Self::new(
            DEFAULT_WRITER,
            DEFAULT_WRITER_ARGS.iter().map(|a| a.to_string()).collect(),
        )
    }
}

impl CommandWriter {
    /// `args` may use `{file}` and `{device}`, which are substituted per write
    pub fn new(program: impl Into<OsString>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn expand_args(&self, file: &Path, device: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|a| match a.as_str() {
                FILE_PLACEHOLDER => file.as_os_str().to_owned(),
                DEVICE_PLACEHOLDER => device.as_os_str().to_owned(),
                _ => a
                    .replace(FILE_PLACEHOLDER, &file.to_string_lossy())
                    .replace(DEVICE_PLACEHOLDER, &device.to_string_lossy())
                    .into(),
            })
            .collect()
    }
}

impl RawWriter for CommandWriter {
    fn write(&mut self, file: &Path, device: &Path) -> Result<(), WriteStatus> {
        let args = self.expand_args(file, device);
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| {
                WriteStatus::Spawn(format!("{}: {}", self.program.to_string_lossy(), e))
            })?;

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(WriteStatus::Exited(code)),
            None => Err(WriteStatus::Signaled),
        }
    }

    fn describe(&self, file: &Path, device: &Path) -> Option<String> {
        Some(format!(
            "{} {}",
            self.program.to_string_lossy(),
            self.expand_args(file, device)
                .iter()
                .map(|a| a.to_string_lossy())
                .format(" ")
        ))
    }
}

/// Accepts every write without touching the device (useful for checking a partition list)
#[derive(Debug, Default)]
pub struct DryRunWriter;

impl RawWriter for DryRunWriter {
    fn write(&mut self, _file: &Path, _device: &Path) -> Result<(), WriteStatus> {
        Ok(())
    }
}
