// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.
//! Turning a device tree partition scheme into a flashable partition list.

use std::{path::PathBuf, str::FromStr};

use indexmap::IndexMap;

use crate::{
    FlashError,
    types::{DtsPartition, PartitionSpec},
};

/// Placeholder replaced with the partition tokens when rendering a script
pub const PARTITIONS_PLACEHOLDER: &str = "###PARTITIONS###";

/// `<label>=<file>`: put `file` onto the partition labelled `label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub label: String,
    pub file: PathBuf,
}

impl FromStr for Assignment {
    type Err = FlashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((label, file)) if !label.is_empty() && !file.is_empty() => Ok(Assignment {
                label: label.to_owned(),
                file: file.into(),
            }),
            _ => Err(FlashError::MalformedAssignment(s.to_owned())),
        }
    }
}

/// Resolve each assignment's label to its partition index, keeping the
/// assignment order as the flashing order.
pub fn build_spec(
    partitions: &IndexMap<String, DtsPartition>,
    assignments: &[Assignment],
) -> Result<PartitionSpec, FlashError> {
    let mut spec = PartitionSpec::default();

    for a in assignments {
        let Some(part) = partitions.get(&a.label) else {
            return Err(FlashError::UnknownPartition(a.label.clone()));
        };
        spec.push(part.index, a.file.clone());
    }

    Ok(spec)
}

pub fn render_template(template: &str, spec: &PartitionSpec) -> String {
    template.replace(PARTITIONS_PLACEHOLDER, &spec.to_string())
}

pub const DEFAULT_DTB_ADDRESS: u64 = 0x0010_0000;
const KERNEL_LOAD_ADDRESS: u64 = 0x0020_0000;
const ROOTFS_LOAD_ADDRESS: u64 = 0x0400_0000;

fn boot_partition<'a>(
    partitions: &'a IndexMap<String, DtsPartition>,
    label: &str,
) -> Result<&'a DtsPartition, FlashError> {
    match partitions.get(label) {
        Some(p) if p.size != 0 => Ok(p),
        _ => Err(FlashError::MissingBootPartition(label.to_owned())),
    }
}

/// U-Boot script that loads kernel and rootfs out of QSPI and boots them.
/// Both "kernel" and "rootfs" partitions must exist with a non-zero size.
pub fn render_boot_script(
    partitions: &IndexMap<String, DtsPartition>,
    dtb_address: u64,
) -> Result<String, FlashError> {
    let kernel = boot_partition(partitions, "kernel")?;
    let rootfs = boot_partition(partitions, "rootfs")?;

    Ok(format!(
        "sf read 0x{KERNEL_LOAD_ADDRESS:08x} 0x{:08x} 0x{:08x};\n\
         sf read 0x{ROOTFS_LOAD_ADDRESS:08x} 0x{:08x} 0x{:08x};\n\
         booti 0x{KERNEL_LOAD_ADDRESS:08x} 0x{ROOTFS_LOAD_ADDRESS:08x} 0x{dtb_address:08x}\n",
        kernel.offset, kernel.size, rootfs.offset, rootfs.size
    ))
}
