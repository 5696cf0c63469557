//! s3commander - browse and fetch objects from S3-compatible storage
//!
//! Lists buckets, objects and versions, prints and downloads objects and
//! runs S3 Select queries.

use clap::{CommandFactory, Parser};
use clap_complete::CompleteEnv;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use s3commander::commands::{self, Cli};

/// Filter applied by --debug
const DEBUG_FILTER: &str = "sc_core=debug,sc_s3=debug,s3commander=debug";

fn main() {
    // Answers `COMPLETE=<shell>` requests and exits; a normal run falls through.
    CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::from_default_env()
    };

    // Logs go to stderr so they never mix with object data on stdout.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start the async runtime");
            std::process::exit(1);
        }
    };
    let exit_code = runtime.block_on(commands::execute(cli));

    std::process::exit(exit_code.as_i32());
}
