// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.

use std::{
    io::{self, BufRead},
    sync::LazyLock,
};

use indexmap::IndexMap;
use regex::Regex;

use crate::{
    FlashError,
    types::{DtsPartition, PartitionEntry, PartitionSpec},
};

fn malformed(token: &str, reason: &str) -> FlashError {
    FlashError::MalformedSpecEntry {
        token: token.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Parse a partition index: plain decimal digits only
pub fn parse_partition_index(index: &str) -> Result<u32, &'static str> {
    // u32::from_str would also take a leading '+'
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return Err("partition index is not a number");
    }
    index
        .parse::<u32>()
        .map_err(|_| "partition index out of range")
}

/// Parse a single `index:path` token. Only the first ':' separates the two.
pub fn parse_partition_entry(token: &str) -> Result<PartitionEntry, FlashError> {
    let Some((index, path)) = token.split_once(':') else {
        return Err(malformed(token, "missing ':' separator"));
    };

    let index = parse_partition_index(index).map_err(|reason| malformed(token, reason))?;

    if path.is_empty() {
        return Err(malformed(token, "empty file path"));
    }

    Ok(PartitionEntry {
        index,
        path: path.into(),
    })
}

/// Parse a whitespace-separated list of `index:path` tokens.
/// Nothing is checked against the filesystem here.
pub fn parse_partition_spec(input: &str) -> Result<PartitionSpec, FlashError> {
    input
        .split_whitespace()
        .map(parse_partition_entry)
        .collect::<Result<Vec<_>, _>>()
        .map(PartitionSpec::new)
}

static PARTITION_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"partition@([0-9]+)\s*\{").unwrap());
static LABEL_PROP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"label\s*=\s*"([^"]+)""#).unwrap());
static REG_PROP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"reg\s*=\s*<\s*([0-9a-fA-Fxob]+)\s+([0-9a-fA-Fxob]+)\s*>").unwrap());

/// Parse an integer literal with an optional 0x/0o/0b radix prefix
pub fn parse_int_literal(s: &str) -> Option<u64> {
    let lower = s.to_ascii_lowercase();
    let (digits, radix) = if let Some(d) = lower.strip_prefix("0x") {
        (d, 16)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (d, 8)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (d, 2)
    } else if lower.len() > 1 && lower.starts_with('0') && lower.bytes().any(|b| b != b'0') {
        // leading-zero decimal such as "010"
        return None;
    } else {
        (lower.as_str(), 10)
    };

    u64::from_str_radix(digits, radix).ok()
}

/// Scan decompiled device tree source (`dtc -O dts`) for flash partitions.
///
/// This is a line-based scan, not a DTS parser: a `partition@N {` line opens a
/// partition, any line holding `};` closes it, and `label`/`reg` properties in
/// between describe it. The returned map keeps device tree order.
pub fn parse_dts_partitions(
    reader: impl BufRead,
) -> io::Result<IndexMap<String, DtsPartition>> {
    let mut parts = IndexMap::new();
    let mut part_idx: Option<u32> = None;
    let mut part_name: Option<String> = None;

    for line in reader.lines() {
        let line = line?;

        if let Some(c) = PARTITION_NODE.captures(&line) {
            part_idx = c[1].parse::<u32>().ok();
        }
        if line.contains("};") {
            part_idx = None;
            part_name = None;
        }

        let Some(index) = part_idx else {
            continue;
        };

        if let Some(c) = LABEL_PROP.captures(&line) {
            part_name = Some(c[1].to_owned());
        }
        if let (Some(c), Some(name)) = (REG_PROP.captures(&line), &part_name) {
            if let (Some(offset), Some(size)) = (parse_int_literal(&c[1]), parse_int_literal(&c[2]))
            {
                parts.insert(
                    name.clone(),
                    DtsPartition {
                        index,
                        offset,
                        size,
                    },
                );
            }
        }
    }

    Ok(parts)
}
