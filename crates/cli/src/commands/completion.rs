//! Shell completion
//!
//! `completion SHELL` prints a static script for bash, zsh, fish, and
//! powershell. Argument values (buckets, keys, version ids) are completed
//! from the live store through clap_complete's dynamic engine:
//!
//! ```text
//! source <(COMPLETE=bash s3commander)
//! ```
//!
//! Value lookups never print anything; any failure yields no candidates.

use std::ffi::OsStr;
use std::future::Future;

use clap::CommandFactory;
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate};
use clap_complete::{Generator, Shell};
use sc_core::listing::{list_buckets, list_objects, list_versions};
use sc_core::{ConfigManager, ObjectStore};
use sc_s3::S3Client;

use super::{Cli, ConnectArgs, Context};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Flags whose value is the following word
const VALUE_FLAGS: &[&str] = &[
    "-r",
    "--region",
    "--endpoint-url",
    "--profile",
    "--version-id",
    "--part-size",
    "--concurrency",
    "--progress",
    "-E",
    "--expression",
];

/// Arguments for the completion command
#[derive(clap::Args, Debug)]
pub struct CompletionArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Generate shell completions and print to stdout
pub fn execute(args: CompletionArgs) -> ExitCode {
    let mut cmd = Cli::command();
    write_completions(args.shell, &mut cmd, &mut std::io::stdout());
    ExitCode::Success
}

fn write_completions<G: Generator>(
    generator: G,
    cmd: &mut clap::Command,
    out: &mut dyn std::io::Write,
) {
    let name = cmd.get_name().to_string();
    clap_complete::generate(generator, cmd, name, out);
}

/// Completer for bucket arguments
pub fn buckets() -> ArgValueCompleter {
    ArgValueCompleter::new(complete_bucket)
}

/// Completer for key and prefix arguments; needs the bucket typed before it
pub fn keys() -> ArgValueCompleter {
    ArgValueCompleter::new(complete_key)
}

/// Completer for `--version-id`; needs the bucket and key typed before it
pub fn version_ids() -> ArgValueCompleter {
    ArgValueCompleter::new(complete_version)
}

fn complete_bucket(current: &OsStr) -> Vec<CompletionCandidate> {
    let current = current.to_string_lossy();
    let line = CompletionLine::from_env();
    lookup(async {
        let client = line.connect().await?;
        Some(bucket_names(&client, &current).await)
    })
}

fn complete_key(current: &OsStr) -> Vec<CompletionCandidate> {
    let current = current.to_string_lossy();
    let line = CompletionLine::from_env();
    let Some(bucket) = line.positionals.first().cloned() else {
        return Vec::new();
    };
    lookup(async {
        let client = line.connect().await?;
        Some(object_keys(&client, &bucket, &current).await)
    })
}

fn complete_version(current: &OsStr) -> Vec<CompletionCandidate> {
    let current = current.to_string_lossy();
    let line = CompletionLine::from_env();
    let [bucket, key, ..] = line.positionals.as_slice() else {
        return Vec::new();
    };
    let (bucket, key) = (bucket.clone(), key.clone());
    lookup(async {
        let client = line.connect().await?;
        Some(version_candidates(&client, &bucket, &key, &current).await)
    })
}

/// Run a lookup on a throwaway runtime; completion happens before the main one starts
fn lookup(values: impl Future<Output = Option<Vec<String>>>) -> Vec<CompletionCandidate> {
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return Vec::new();
    };
    runtime
        .block_on(values)
        .unwrap_or_default()
        .into_iter()
        .map(CompletionCandidate::new)
        .collect()
}

async fn bucket_names(store: &dyn ObjectStore, current: &str) -> Vec<String> {
    list_buckets(store)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|name| name.starts_with(current))
        .collect()
}

/// Keys on the first listing page under the typed prefix
async fn object_keys(store: &dyn ObjectStore, bucket: &str, current: &str) -> Vec<String> {
    list_objects(store, bucket, Some(current), false)
        .await
        .unwrap_or_default()
}

async fn version_candidates(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    current: &str,
) -> Vec<String> {
    list_versions(store, bucket, key)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|record| record.key == key && record.version_id.starts_with(current))
        .map(|record| record.version_id)
        .collect()
}

/// The command line being completed, as far as value lookups need it
#[derive(Debug, Default)]
struct CompletionLine {
    /// Positional words after the subcommand name
    positionals: Vec<String>,
    connect: ConnectArgs,
}

impl CompletionLine {
    /// Read the words the shell passes after `--`, up to the one being completed
    fn from_env() -> Self {
        let args: Vec<String> = std::env::args_os()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let words = match args.iter().position(|a| a == "--") {
            Some(i) => &args[i + 1..],
            None => &[][..],
        };
        // bash reports the cursor word; other shells complete the last one.
        let current = std::env::var("_CLAP_COMPLETE_INDEX")
            .ok()
            .and_then(|i| i.parse::<usize>().ok())
            .unwrap_or(words.len().saturating_sub(1))
            .min(words.len());
        // words[0] is the program name.
        Self::parse(words.get(1..current).unwrap_or_default())
    }

    fn parse(words: &[String]) -> Self {
        let mut line = Self::default();
        let mut in_subcommand = false;
        let mut words = words.iter();

        while let Some(word) = words.next() {
            if word.len() > 1 && word.starts_with('-') {
                let (flag, inline) = match word.split_once('=') {
                    Some((flag, value)) => (flag, Some(value.to_string())),
                    None => (word.as_str(), None),
                };
                if !VALUE_FLAGS.contains(&flag) {
                    continue;
                }
                let value = inline.or_else(|| words.next().cloned());
                match flag {
                    "-r" | "--region" => line.connect.region = value,
                    "--endpoint-url" => line.connect.endpoint_url = value,
                    "--profile" => line.connect.profile = value,
                    _ => {}
                }
            } else if in_subcommand {
                line.positionals.push(word.clone());
            } else {
                in_subcommand = true;
            }
        }

        line
    }

    /// Connect the way a normal run would: flag, environment, config file
    async fn connect(self) -> Option<S3Client> {
        let config = ConfigManager::new()
            .and_then(|manager| manager.load())
            .unwrap_or_default();
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let connect = ConnectArgs {
            region: self.connect.region.or_else(|| env("AWS_REGION")),
            endpoint_url: self
                .connect
                .endpoint_url
                .or_else(|| env("AWS_ENDPOINT_URL")),
            profile: self.connect.profile.or_else(|| env("AWS_PROFILE")),
        };
        let client_config = Context::new(Formatter::default(), config, connect)
            .client_config()
            .ok()?;
        S3Client::new(client_config).await.ok()
    }
}
