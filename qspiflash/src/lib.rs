// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.
//! Writes firmware images onto the raw QSPI flash partitions of a target,
//! one partition at a time, stopping at the first failed write.

use std::path::PathBuf;

use thiserror::Error;

pub mod flasher;
pub mod parsers;
pub mod plan;
pub mod types;
pub mod writer;

pub use flasher::Flasher;
pub use types::{
    DeviceNaming, DtsPartition, FlashReport, FlashRunResult, FlashState, PartitionEntry,
    PartitionSpec, WriteStatus,
};
pub use writer::{CommandWriter, DryRunWriter, RawWriter};

/// Printed once every partition has been written
pub const FINISHED_MARKER: &str = "FINISHED";

#[derive(Debug, Error)]
pub enum FlashError {
    #[error("malformed partition entry '{token}': {reason}")]
    MalformedSpecEntry { token: String, reason: String },

    #[error("failed to flash {} to {} (partition {index}, entry {position}): {status}", .path.display(), .device.display())]
    WriteFailure {
        position: usize,
        index: u32,
        device: PathBuf,
        path: PathBuf,
        status: WriteStatus,
    },

    #[error("no partition labelled '{0}' in the device tree")]
    UnknownPartition(String),

    #[error("no usable '{0}' partition in the device tree, can't generate a boot script")]
    MissingBootPartition(String),

    #[error("malformed assignment '{0}', expected <label>=<file>")]
    MalformedAssignment(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
