//! print command - Display object contents
//!
//! Writes the entire object to stdout without any transformation.

use std::io::{self, Write};

use clap::Args;
use sc_core::ObjectRef;
use sc_core::content::get_object_bytes;

use super::{Context, completion};
use crate::exit_code::ExitCode;

/// Display object contents
#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Bucket name
    #[arg(add = completion::buckets())]
    pub bucket: String,

    /// Object key
    #[arg(add = completion::keys())]
    pub key: String,

    /// Specific version ID to retrieve
    #[arg(long, add = completion::version_ids())]
    pub version_id: Option<String>,
}

/// Execute the print command
pub async fn execute(args: PrintArgs, ctx: &Context) -> ExitCode {
    let object = ObjectRef::new(args.bucket, args.key).with_version(args.version_id);

    let client = match ctx.connect().await {
        Ok(c) => c,
        Err(code) => return code,
    };

    match get_object_bytes(&client, &object).await {
        Ok(data) => {
            // Bypass the formatter so binary data passes through untouched.
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(&data).and_then(|()| stdout.flush()) {
                return ctx.fail("Failed to write to stdout", &e.into());
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&format!("Failed to get {object}"), &e),
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_parse_with_version() {
        let cli =
            Cli::try_parse_from(["s3commander", "print", "b", "a/b.txt", "--version-id", "v9"])
                .unwrap();
        match cli.command {
            Commands::Print(args) => {
                assert_eq!(args.bucket, "b");
                assert_eq!(args.key, "a/b.txt");
                assert_eq!(args.version_id.as_deref(), Some("v9"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
