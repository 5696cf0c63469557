//! cp command - Download an object
//!
//! Fetches an object as concurrent byte ranges and publishes it atomically
//! into a local directory under the key's file name.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use sc_core::download::download;
use sc_core::{
    DownloadConfig, DownloadOptions, DownloadReport, LineProgress, NoProgress, ObjectRef,
    ProgressObserver,
};
use serde::Serialize;

use super::{Context, completion};
use crate::exit_code::ExitCode;
use crate::output::{OutputConfig, TransferBar};

/// How download progress is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProgressMode {
    /// One `size=.. downloaded=.. percentage=..%` line per update
    Lines,
    /// Interactive progress bar
    Bar,
    /// No progress output
    None,
}

impl ProgressMode {
    /// Parse the `progress` value from the config file
    fn from_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }
}

/// Download an object
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source bucket
    #[arg(add = completion::buckets())]
    pub bucket: String,

    /// Source object key
    #[arg(add = completion::keys())]
    pub key: String,

    /// Destination directory (defaults to the current directory)
    pub dest: Option<PathBuf>,

    /// Download a specific version
    #[arg(long, add = completion::version_ids())]
    pub version_id: Option<String>,

    /// Fail if the destination file already exists
    #[arg(long)]
    pub no_clobber: bool,

    /// Size of each ranged request in bytes
    #[arg(long)]
    pub part_size: Option<u64>,

    /// Number of ranged requests in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Progress reporting
    #[arg(long, value_enum)]
    pub progress: Option<ProgressMode>,
}

#[derive(Debug, Serialize)]
struct CpOutput {
    status: &'static str,
    source: String,
    path: String,
    size_bytes: u64,
    size_human: String,
}

impl CpOutput {
    fn new(source: &ObjectRef, report: &DownloadReport) -> Self {
        Self {
            status: "success",
            source: source.to_string(),
            path: report.path.display().to_string(),
            size_bytes: report.size,
            size_human: humansize::format_size(report.size, humansize::BINARY),
        }
    }
}

/// Execute the cp command
pub async fn execute(args: CpArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;
    let object = ObjectRef::new(&args.bucket, &args.key).with_version(args.version_id.clone());

    let options = download_options(&args, ctx);
    let mode = progress_mode(&args, ctx);

    let client = match ctx.connect().await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let observer = observer_for(mode, formatter.config(), &object);
    let result = download(&client, &object, &options, observer.as_ref()).await;

    match result {
        Ok(report) => {
            let output = CpOutput::new(&object, &report);
            if formatter.is_json() {
                formatter.json(&output);
            } else {
                formatter.success(&format!(
                    "{} -> {} ({})",
                    output.source, output.path, output.size_human
                ));
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&format!("Failed to download {object}"), &e),
    }
}

fn download_options(args: &CpArgs, ctx: &Context) -> DownloadOptions {
    let transfer = &ctx.config.transfer;
    DownloadOptions {
        destination: args.dest.clone(),
        no_clobber: args.no_clobber,
        config: DownloadConfig::new()
            .part_size(args.part_size.unwrap_or(transfer.part_size))
            .concurrency(args.concurrency.unwrap_or(transfer.concurrency)),
    }
}

fn progress_mode(args: &CpArgs, ctx: &Context) -> ProgressMode {
    if let Some(mode) = args.progress {
        return mode;
    }
    ProgressMode::from_config(&ctx.config.transfer.progress).unwrap_or_else(|| {
        tracing::warn!(
            value = %ctx.config.transfer.progress,
            "unknown progress mode in config file, using lines"
        );
        ProgressMode::Lines
    })
}

fn observer_for(
    mode: ProgressMode,
    output: &OutputConfig,
    object: &ObjectRef,
) -> Box<dyn ProgressObserver> {
    // Progress would corrupt JSON output.
    if output.quiet || output.json {
        return Box::new(NoProgress);
    }
    match mode {
        ProgressMode::Lines => Box::new(LineProgress::new(std::io::stdout())),
        ProgressMode::Bar => Box::new(TransferBar::new(output, &object.key)),
        ProgressMode::None => Box::new(NoProgress),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands, ConnectArgs};
    use crate::output::Formatter;
    use clap::Parser;
    use sc_core::Config;

    fn cp_args(argv: &[&str]) -> CpArgs {
        let mut full = vec!["s3commander", "cp"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Cp(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn ctx_with(config: Config) -> Context {
        Context::new(Formatter::default(), config, ConnectArgs::default())
    }

    #[test]
    fn test_parse_full() {
        let args = cp_args(&[
            "bucket",
            "dir/file.bin",
            "/tmp/out",
            "--version-id",
            "v1",
            "--no-clobber",
            "--part-size",
            "1048576",
            "--concurrency",
            "8",
            "--progress",
            "bar",
        ]);
        assert_eq!(args.bucket, "bucket");
        assert_eq!(args.key, "dir/file.bin");
        assert_eq!(args.dest, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.version_id.as_deref(), Some("v1"));
        assert!(args.no_clobber);
        assert_eq!(args.part_size, Some(1_048_576));
        assert_eq!(args.concurrency, Some(8));
        assert_eq!(args.progress, Some(ProgressMode::Bar));
    }

    #[test]
    fn test_options_fall_back_to_config() {
        let mut config = Config::default();
        config.transfer.part_size = 16 * 1024 * 1024;
        config.transfer.concurrency = 2;

        let options = download_options(&cp_args(&["b", "k"]), &ctx_with(config));
        assert_eq!(options.destination, None);
        assert!(!options.no_clobber);
        assert_eq!(options.config.part_size, 16 * 1024 * 1024);
        assert_eq!(options.config.concurrency, 2);
    }

    #[test]
    fn test_flags_override_config() {
        let options = download_options(
            &cp_args(&["b", "k", "--part-size", "1048576", "--concurrency", "0"]),
            &ctx_with(Config::default()),
        );
        assert_eq!(options.config.part_size, 1_048_576);
        // Concurrency is clamped to at least one request.
        assert_eq!(options.config.concurrency, 1);
    }

    #[test]
    fn test_progress_mode_resolution() {
        let mut config = Config::default();
        assert_eq!(
            progress_mode(&cp_args(&["b", "k"]), &ctx_with(config.clone())),
            ProgressMode::Lines
        );

        config.transfer.progress = "None".into();
        assert_eq!(
            progress_mode(&cp_args(&["b", "k"]), &ctx_with(config.clone())),
            ProgressMode::None
        );

        config.transfer.progress = "sparkles".into();
        assert_eq!(
            progress_mode(&cp_args(&["b", "k"]), &ctx_with(config.clone())),
            ProgressMode::Lines
        );

        assert_eq!(
            progress_mode(&cp_args(&["b", "k", "--progress", "bar"]), &ctx_with(config)),
            ProgressMode::Bar
        );
    }

    #[test]
    fn test_output_record() {
        let object = ObjectRef::new("b", "dir/file.bin");
        let report = DownloadReport {
            path: PathBuf::from("/tmp/file.bin"),
            size: 2048,
            bytes_written: 2048,
        };
        let value = serde_json::to_value(CpOutput::new(&object, &report)).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["source"], "s3://b/dir/file.bin");
        assert_eq!(value["path"], "/tmp/file.bin");
        assert_eq!(value["size_bytes"], 2048);
        assert_eq!(value["size_human"], "2 KiB");
    }
}
