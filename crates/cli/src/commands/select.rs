//! select command - Run an S3 Select query
//!
//! The object is read as JSON Lines and result records are written to
//! stdout as they arrive.

use clap::Args;
use sc_core::ObjectRef;
use sc_core::query::run_query;

use super::{Context, completion};
use crate::exit_code::ExitCode;

/// Run an S3 Select query
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Bucket name
    #[arg(add = completion::buckets())]
    pub bucket: String,

    /// Object key
    #[arg(add = completion::keys())]
    pub key: String,

    /// SQL expression (defaults to counting all records)
    #[arg(short = 'E', long)]
    pub expression: Option<String>,
}

/// Execute the select command
pub async fn execute(args: SelectArgs, ctx: &Context) -> ExitCode {
    let formatter = &ctx.formatter;
    let object = ObjectRef::new(args.bucket, args.key);

    let client = match ctx.connect().await {
        Ok(c) => c,
        Err(code) => return code,
    };

    let mut stdout = std::io::stdout();
    match run_query(&client, &object, args.expression.as_deref(), &mut stdout).await {
        Ok(summary) => {
            if !summary.completed {
                formatter.warning("Query stream ended before the end event; results may be incomplete");
            }
            if formatter.is_verbose()
                && let Some(stats) = summary.stats
            {
                eprintln!(
                    "{}",
                    formatter.dim(&format!(
                        "scanned {} bytes, processed {} bytes, returned {} bytes",
                        stats.bytes_scanned, stats.bytes_processed, stats.bytes_returned
                    ))
                );
            }
            ExitCode::Success
        }
        Err(e) => ctx.fail(&format!("Query on {object} failed"), &e),
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_parse_expression() {
        let cli = Cli::try_parse_from([
            "s3commander",
            "select",
            "logs",
            "2024/app.jsonl",
            "-E",
            "select s.level from S3Object s",
        ])
        .unwrap();
        match cli.command {
            Commands::Select(args) => {
                assert_eq!(args.key, "2024/app.jsonl");
                assert_eq!(
                    args.expression.as_deref(),
                    Some("select s.level from S3Object s")
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_expression_is_optional() {
        let cli = Cli::try_parse_from(["s3commander", "select", "logs", "app.jsonl"]).unwrap();
        match cli.command {
            Commands::Select(args) => assert!(args.expression.is_none()),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
