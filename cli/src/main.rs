// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use owo_colors::OwoColorize;
use qspiflash::{
    DeviceNaming, PartitionSpec,
    parsers::parse_partition_index,
    plan::{Assignment, DEFAULT_DTB_ADDRESS, build_spec, render_boot_script, render_template},
    types::DEFAULT_DEVICE_PREFIX,
    writer::DEFAULT_WRITER,
};
use flasher::{WriterOptions, run_flash, spec_from_args};
use util::{print_partition_table, read_dts_partitions, write_output};

use std::fs;

mod flasher;
mod util;

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Flash a list of <index>:<file> partitions, in order, stopping at the first failure
    Flash {
        #[arg(value_name = "INDEX:FILE")]
        partitions: Vec<String>,
    },

    /// Flash a single file onto a single partition
    Write {
        #[arg(value_parser = parse_partition_index)]
        index: u32,

        #[arg()]
        file_path: String,
    },

    /// Build the partition list from a device tree and <label>=<file> assignments
    Plan {
        /// Decompiled device tree (dtc -I dtb -O dts)
        #[arg(long, value_name = "FILE")]
        dts: String,

        #[arg(value_name = "LABEL=FILE")]
        assignments: Vec<Assignment>,

        /// Substitute the list into this template at ###PARTITIONS###
        #[arg(short, long, value_name = "FILE")]
        template: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,

        /// Also write a U-Boot script booting the kernel and rootfs partitions
        #[arg(long, value_name = "FILE")]
        boot_script: Option<String>,

        #[arg(long, default_value_t = DEFAULT_DTB_ADDRESS, value_parser = maybe_hex::<u64>)]
        dtb_address: u64,
    },

    /// Print the flash partitions described by a device tree
    PrintPartitions {
        #[arg(long, value_name = "FILE")]
        dts: String,
    },
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = DEFAULT_DEVICE_PREFIX, help = "Partition N is <prefix>N")]
    device_prefix: String,

    /// Program invoked once per partition
    #[arg(long, default_value = DEFAULT_WRITER, value_name = "PROGRAM")]
    writer: String,

    /// Writer argument, {file} and {device} are substituted (default: -v {file} {device})
    #[arg(long = "writer-arg", value_name = "ARG", allow_hyphen_values = true)]
    writer_args: Vec<String>,

    /// Announce every partition, but never actually write anything
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// Echo every writer command line
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let naming = DeviceNaming::new(args.device_prefix);
    let writer_opts = WriterOptions {
        program: args.writer,
        args: args.writer_args,
        dry_run: args.dry_run,
        verbose: args.verbose,
    };

    match args.command {
        Command::Flash { partitions } => {
            let spec = spec_from_args(&partitions)?;
            run_flash(&writer_opts, naming, &spec, &mut anstream::stdout())?;
        }
        Command::Write { index, file_path } => {
            let mut spec = PartitionSpec::default();
            spec.push(index, file_path);
            run_flash(&writer_opts, naming, &spec, &mut anstream::stdout())?;
        }
        Command::Plan {
            dts,
            assignments,
            template,
            output,
            boot_script,
            dtb_address,
        } => {
            let parts = read_dts_partitions(&dts)?;
            let spec = build_spec(&parts, &assignments)?;

            if let Some(b) = boot_script {
                write_output(&b, &render_boot_script(&parts, dtb_address)?)?;
                anstream::println!("{} {}", "Wrote".bright_black(), b.bright_yellow());
            }

            let rendered = match template {
                Some(t) => {
                    let template = fs::read_to_string(&t)
                        .with_context(|| format!("Couldn't read template {t}"))?;
                    render_template(&template, &spec)
                }
                None => format!("{spec}\n"),
            };

            match output {
                Some(o) => {
                    write_output(&o, &rendered)?;
                    anstream::println!("{} {}", "Wrote".bright_black(), o.bright_yellow());
                }
                None => anstream::print!("{rendered}"),
            }
        }
        Command::PrintPartitions { dts } => {
            print_partition_table(&dts, &read_dts_partitions(&dts)?)
        }
    };

    Ok(())
}
