// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) Qualcomm Technologies, Inc. and/or its subsidiaries.
use anyhow::Result;
use owo_colors::OwoColorize;
use qspiflash::{
    CommandWriter, DeviceNaming, DryRunWriter, FlashReport, Flasher, PartitionSpec, RawWriter,
    writer::DEFAULT_WRITER_ARGS,
};
use std::io::Write;

pub(crate) struct WriterOptions {
    pub program: String,
    pub args: Vec<String>,
    pub dry_run: bool,
    pub verbose: bool,
}

impl WriterOptions {
    fn build(&self) -> Box<dyn RawWriter> {
        if self.dry_run {
            return Box::new(DryRunWriter);
        }

        let args = match self.args.is_empty() {
            true => DEFAULT_WRITER_ARGS.iter().map(|a| a.to_string()).collect(),
            false => self.args.clone(),
        };
        Box::new(CommandWriter::new(&self.program, args))
    }
}

/// The shell may hand us the whole list as one argument or as many, accept both
pub(crate) fn spec_from_args(partitions: &[String]) -> Result<PartitionSpec> {
    Ok(partitions.join(" ").parse()?)
}

/// Flashes the partitions in order, the first failure aborts the whole run.
pub(crate) fn run_flash(
    opts: &WriterOptions,
    naming: DeviceNaming,
    spec: &PartitionSpec,
    log: &mut impl Write,
) -> Result<FlashReport> {
    if opts.dry_run {
        writeln!(log, "{}", "Dry run, nothing will be written".bright_black())?;
    }
    if opts.verbose {
        writeln!(
            log,
            "{} partition(s): {}",
            spec.len().bright_blue(),
            spec.to_string().bright_black()
        )?;
    }

    let mut flasher = Flasher::new(opts.build(), naming).verbose(opts.verbose);
    let res = flasher.flash_all(spec, log);

    if opts.verbose {
        writeln!(log, "Flash {}", flasher.state().bright_yellow())?;
    }

    Ok(res?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qspiflash::{FlashError, FlashState, WriteStatus};
    use std::path::Path;

    fn opts(program: &str, args: &[&str]) -> WriterOptions {
        WriterOptions {
            program: program.to_owned(),
            args: args.iter().map(|a| a.to_string()).collect(),
            dry_run: false,
            verbose: false,
        }
    }

    fn spec(s: &str) -> PartitionSpec {
        s.parse().unwrap()
    }

    fn flash(opts: &WriterOptions, s: &str) -> (Result<FlashReport>, String) {
        let mut log = Vec::new();
        let res = run_flash(opts, DeviceNaming::default(), &spec(s), &mut log);
        (res, String::from_utf8(log).unwrap())
    }

    #[test]
    fn default_writer_args() {
        let w = opts("flashcp", &[]).build();
        assert_eq!(
            w.describe(Path::new("/img/boot.bin"), Path::new("/dev/mtd0")),
            Some("flashcp -v /img/boot.bin /dev/mtd0".to_owned())
        );
    }

    #[test]
    fn custom_writer_args_replace_defaults() {
        let w = opts("dd", &["if={file}", "of={device}"]).build();
        assert_eq!(
            w.describe(Path::new("a.bin"), Path::new("/dev/mtd2")),
            Some("dd if=a.bin of=/dev/mtd2".to_owned())
        );
    }

    #[test]
    fn dry_run_never_spawns() {
        let o = WriterOptions {
            dry_run: true,
            ..opts("/nonexistent/writer", &[])
        };
        assert_eq!(o.build().describe(Path::new("a"), Path::new("b")), None);

        let (res, log) = flash(&o, "0:/img/boot.bin 1:/img/root.img");
        assert_eq!(res.unwrap(), FlashReport { written: 2 });
        assert!(log.contains("Flashing /img/root.img to /dev/mtd1"));
        assert!(log.ends_with("FINISHED\n"));
    }

    #[test]
    fn args_are_joined_into_one_list() {
        let s = spec_from_args(&[
            "0:/img/boot.bin 1:/img/root.img".to_owned(),
            "2:/img/kernel.bin".to_owned(),
        ]).unwrap();
        assert_eq!(s.to_string(), "0:/img/boot.bin 1:/img/root.img 2:/img/kernel.bin");

        assert!(spec_from_args(&[]).unwrap().is_empty());
        assert!(spec_from_args(&[String::new()]).unwrap().is_empty());
        assert!(spec_from_args(&["0:/a".to_owned(), "bogus".to_owned()]).is_err());
    }

    #[test]
    fn empty_list_finishes() {
        let (res, log) = flash(&opts("/nonexistent/writer", &[]), "");
        assert_eq!(res.unwrap(), FlashReport { written: 0 });
        assert_eq!(log, "FINISHED\n");
    }

    #[cfg(unix)]
    #[test]
    fn all_writes_succeed() {
        let (res, log) = flash(&opts("true", &[]), "0:/img/boot.bin 1:/img/root.img");
        assert_eq!(res.unwrap(), FlashReport { written: 2 });
        assert_eq!(
            log,
            "Flashing /img/boot.bin to /dev/mtd0\nFlashing /img/root.img to /dev/mtd1\nFINISHED\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn first_failure_is_reported_on_one_line() {
        let o = opts("sh", &["-c", "exit 1"]);
        let (res, log) = flash(&o, "0:/img/boot.bin 1:/img/root.img");

        assert_eq!(log, "Flashing /img/boot.bin to /dev/mtd0\n");

        let err = res.unwrap_err();
        let msg = err.to_string();
        assert!(!msg.contains('\n'));
        assert!(msg.contains("/img/boot.bin"));
        assert!(msg.contains("/dev/mtd0"));
        assert!(msg.contains("exit status 1"));
        assert!(matches!(
            err.downcast_ref::<FlashError>(),
            Some(FlashError::WriteFailure {
                position: 0,
                status: WriteStatus::Exited(1),
                ..
            })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn verbose_reports_commands_and_final_state() {
        let o = WriterOptions {
            verbose: true,
            ..opts("sh", &["-c", "exit 2"])
        };
        let (res, log) = flash(&o, "4:/img/rootfs.ub");

        assert!(res.is_err());
        assert!(log.contains("+ sh -c exit 2"));
        assert!(log.contains(&FlashState::Failed(0).to_string()));
        assert!(!log.contains("FINISHED"));
    }
}
