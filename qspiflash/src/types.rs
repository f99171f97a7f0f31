// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.
use std::{
    fmt::{self, Display},
    path::PathBuf,
    str::FromStr,
};

use itertools::Itertools;

use crate::{FlashError, parsers::parse_partition_spec};

/// A single `index:path` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionEntry {
    pub index: u32,
    pub path: PathBuf,
}

impl Display for PartitionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.path.display())
    }
}

/// Ordered list of partitions to flash. The order is the flashing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSpec {
    entries: Vec<PartitionEntry>,
}

impl PartitionSpec {
    pub fn new(entries: Vec<PartitionEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PartitionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, index: u32, path: impl Into<PathBuf>) {
        self.entries.push(PartitionEntry {
            index,
            path: path.into(),
        });
    }
}

impl FromStr for PartitionSpec {
    type Err = FlashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_partition_spec(s)
    }
}

/// Renders the spec back into its whitespace-separated token form
impl Display for PartitionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entries.iter().format(" "))
    }
}

/// Maps a partition index onto a raw device node, e.g. 2 -> /dev/mtd2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNaming {
    pub prefix: String,
}

pub const DEFAULT_DEVICE_PREFIX: &str = "/dev/mtd";

impl Default for DeviceNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_DEVICE_PREFIX.to_owned(),
        }
    }
}

impl DeviceNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn resolve(&self, index: u32) -> PathBuf {
        PathBuf::from(format!("{}{}", self.prefix, index))
    }
}

/// Why the raw-device writer did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// Non-zero exit status, kept as reported
    Exited(i32),
    /// Killed before it could report an exit status
    Signaled,
    /// The writer could not be started at all
    Spawn(String),
}

impl Display for WriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStatus::Exited(code) => write!(f, "exit status {code}"),
            WriteStatus::Signaled => write!(f, "terminated by signal"),
            WriteStatus::Spawn(e) => write!(f, "couldn't start writer: {e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlashState {
    #[default]
    Pending,
    /// Position (not device index) of the entry being written
    Running(usize),
    Succeeded,
    Failed(usize),
}

impl Display for FlashState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashState::Pending => write!(f, "pending"),
            FlashState::Running(i) => write!(f, "running entry {i}"),
            FlashState::Succeeded => write!(f, "succeeded"),
            FlashState::Failed(i) => write!(f, "failed at entry {i}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashReport {
    pub written: usize,
}

pub type FlashRunResult = Result<FlashReport, FlashError>;

/// A partition as described by the device tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtsPartition {
    pub index: u32,
    pub offset: u64,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_naming_appends_index() {
        assert_eq!(
            DeviceNaming::default().resolve(3),
            PathBuf::from("/dev/mtd3")
        );
        assert_eq!(
            DeviceNaming::new("/dev/mtdblock").resolve(0),
            PathBuf::from("/dev/mtdblock0")
        );
    }

    #[test]
    fn spec_displays_as_tokens() {
        let mut spec = PartitionSpec::default();
        spec.push(0, "/img/boot.bin");
        spec.push(1, "/img/a:b.img");

        let rendered = spec.to_string();
        assert_eq!(rendered, "0:/img/boot.bin 1:/img/a:b.img");
        assert_eq!(rendered.parse::<PartitionSpec>().unwrap(), spec);
    }

    #[test]
    fn flash_state_messages() {
        assert_eq!(FlashState::default(), FlashState::Pending);
        assert_eq!(FlashState::Running(2).to_string(), "running entry 2");
        assert_eq!(FlashState::Succeeded.to_string(), "succeeded");
        assert_eq!(FlashState::Failed(1).to_string(), "failed at entry 1");
    }

    #[test]
    fn write_status_messages() {
        assert_eq!(WriteStatus::Exited(1).to_string(), "exit status 1");
        assert_eq!(WriteStatus::Signaled.to_string(), "terminated by signal");
    }
}
