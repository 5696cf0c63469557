//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Flags are parsed into plain structs and passed down explicitly.

use clap::{Parser, Subcommand};
use sc_core::{ClientConfig, Config, ConfigManager, Error};
use sc_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

pub mod completion;
mod config;
pub mod cp;
mod creds;
mod ls;
mod print;
mod select;
mod versions;

/// s3commander - browse and fetch objects from S3-compatible storage
///
/// Lists buckets, objects and versions, prints and downloads objects and
/// runs S3 Select queries.
#[derive(Parser, Debug)]
#[command(name = "s3commander")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Region to connect to
    #[arg(short, long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Custom endpoint URL for S3-compatible services
    #[arg(long, global = true, env = "AWS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Named profile from the shared AWS config files
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Enable debug logging
    #[arg(short = 'g', long, global = true, default_value = "false")]
    pub debug: bool,

    /// Show full records and unmasked secrets
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List buckets, or object keys in a bucket
    #[command(alias = "list")]
    Ls(ls::LsArgs),

    /// Download an object into a local directory
    Cp(cp::CpArgs),

    /// Print object contents
    Print(print::PrintArgs),

    /// Run an S3 Select query against a JSON Lines object
    Select(select::SelectArgs),

    /// List versions and delete markers of an object
    ListVersions(versions::ListVersionsArgs),

    /// Show the credentials requests are signed with
    Creds,

    /// Generate shell completion scripts
    Completion(completion::CompletionArgs),

    /// Show or create the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Connection flags, before the config file is consulted
#[derive(Debug, Clone, Default)]
pub struct ConnectArgs {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub profile: Option<String>,
}

/// Everything a command needs besides its own arguments
pub struct Context {
    pub formatter: Formatter,
    pub config: Config,
    connect: ConnectArgs,
}

impl Context {
    pub fn new(formatter: Formatter, config: Config, connect: ConnectArgs) -> Self {
        Self {
            formatter,
            config,
            connect,
        }
    }

    /// Build the client configuration: flag or environment, then config file
    pub fn client_config(&self) -> sc_core::Result<ClientConfig> {
        let defaults = &self.config.defaults;

        let region = self
            .connect
            .region
            .clone()
            .or_else(|| defaults.region.clone())
            .ok_or_else(|| {
                Error::Config(
                    "No region configured. Pass --region, set AWS_REGION or add one to the config file"
                        .into(),
                )
            })?;

        let mut client_config =
            ClientConfig::new(region)?.force_path_style(defaults.force_path_style);

        if let Some(endpoint) = self
            .connect
            .endpoint_url
            .as_ref()
            .or(defaults.endpoint_url.as_ref())
        {
            client_config = client_config.endpoint_url(endpoint.clone())?;
        }

        if let Some(profile) = self.connect.profile.as_ref().or(defaults.profile.as_ref()) {
            client_config = client_config.profile(profile.clone());
        }

        Ok(client_config)
    }

    /// Create the S3 client, reporting failures through the formatter
    pub async fn connect(&self) -> Result<S3Client, ExitCode> {
        let client_config = self
            .client_config()
            .map_err(|e| self.fail("Invalid client configuration", &e))?;

        S3Client::new(client_config)
            .await
            .map_err(|e| self.fail("Failed to create S3 client", &e))
    }

    /// Print an error and map it to its exit code
    pub fn fail(&self, context: &str, err: &Error) -> ExitCode {
        self.formatter.error(&format!("{context}: {err}"));
        ExitCode::from(err)
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let bootstrap = Formatter::new(output_config(&cli, None));

    // Completion and config management run without loading the config file.
    match cli.command {
        Commands::Completion(args) => return completion::execute(args),
        Commands::Config(cmd) => return config::execute(cmd, &bootstrap),
        _ => {}
    }

    let loaded = ConfigManager::new().and_then(|manager| manager.load());
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            bootstrap.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    let formatter = Formatter::new(output_config(&cli, Some(&config)));
    let connect = ConnectArgs {
        region: cli.region,
        endpoint_url: cli.endpoint_url,
        profile: cli.profile,
    };
    let ctx = Context::new(formatter, config, connect);

    match cli.command {
        Commands::Ls(args) => ls::execute(args, &ctx).await,
        Commands::Cp(args) => cp::execute(args, &ctx).await,
        Commands::Print(args) => print::execute(args, &ctx).await,
        Commands::Select(args) => select::execute(args, &ctx).await,
        Commands::ListVersions(args) => versions::execute(args, &ctx).await,
        Commands::Creds => creds::execute(&ctx).await,
        Commands::Completion(_) | Commands::Config(_) => ExitCode::Success,
    }
}

fn output_config(cli: &Cli, config: Option<&Config>) -> OutputConfig {
    let json_default = config.is_some_and(|c| c.defaults.output == "json");
    OutputConfig {
        json: cli.json || json_default,
        no_color: cli.no_color,
        quiet: cli.quiet,
        verbose: cli.verbose,
    }
}
