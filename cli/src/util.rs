// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.
use anyhow::{Context, Result};
use indexmap::IndexMap;
use owo_colors::OwoColorize;
use std::{
    fs::{self, File},
    io::BufReader,
};

use qspiflash::{DtsPartition, parsers::parse_dts_partitions};

pub fn read_dts_partitions(dts_path: &str) -> Result<IndexMap<String, DtsPartition>> {
    let file = File::open(dts_path).with_context(|| format!("Couldn't open {dts_path}"))?;
    let parts = parse_dts_partitions(BufReader::new(file))
        .with_context(|| format!("Couldn't read {dts_path}"))?;

    if parts.is_empty() {
        anstream::eprintln!(
            "{} no flash partitions found in {}",
            "warning:".yellow(),
            dts_path
        );
    }

    Ok(parts)
}

pub fn print_partition_table(dts_path: &str, parts: &IndexMap<String, DtsPartition>) {
    anstream::println!("Flash partitions in {}:", dts_path.bright_yellow());

    for (label, part) in parts.iter() {
        anstream::println!(
            "{}] {}: offset = 0x{:08x}, {} bytes ({} kiB)",
            part.index,
            label,
            part.offset,
            part.size,
            part.size / 1024
        );
    }
}

/// Write a generated file; on unix it is made executable since it's usually a script
pub fn write_output(path: &str, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Couldn't write {path}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_generated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flash.sh");
        let path = path.to_str().unwrap();

        write_output(path, "#!/bin/sh\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "#!/bin/sh\n");
    }

    #[cfg(unix)]
    #[test]
    fn generated_file_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flash.sh");
        let path = path.to_str().unwrap();

        write_output(path, "#!/bin/sh\n").unwrap();
        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn reads_partitions_from_dts_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system.dts");
        fs::write(
            &path,
            "partition@3 {\n\tlabel = \"kernel\";\n\treg = <0x1e40000 0x1400000>;\n};\n",
        )
        .unwrap();

        let parts = read_dts_partitions(path.to_str().unwrap()).unwrap();
        assert_eq!(parts["kernel"].index, 3);
        assert!(read_dts_partitions(dir.path().join("missing.dts").to_str().unwrap()).is_err());
    }
}
