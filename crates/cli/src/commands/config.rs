//! config command - Show or create the configuration file

use clap::Subcommand;
use sc_core::{Config, ConfigManager, Error};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Configuration file commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration and where it is read from
    Show,

    /// Write a configuration file with default values
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Serialize)]
struct ShowOutput<'a> {
    path: String,
    exists: bool,
    config: &'a Config,
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, formatter: &Formatter) -> ExitCode {
    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to locate configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    let result = match cmd {
        ConfigCommands::Show => show(&manager, formatter),
        ConfigCommands::Init { force } => init(&manager, force, formatter),
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

fn show(manager: &ConfigManager, formatter: &Formatter) -> sc_core::Result<()> {
    let config = manager.load()?;
    let path = manager.config_path();

    if formatter.is_json() {
        formatter.json(&ShowOutput {
            path: path.display().to_string(),
            exists: path.exists(),
            config: &config,
        });
    } else {
        let origin = if path.exists() { "" } else { " (not created, showing defaults)" };
        formatter.println(&formatter.dim(&format!("# {}{origin}", path.display())));
        formatter.println(toml::to_string_pretty(&config)?.trim_end());
    }
    Ok(())
}

fn init(manager: &ConfigManager, force: bool, formatter: &Formatter) -> sc_core::Result<()> {
    let path = manager.config_path();
    if path.exists() && !force {
        return Err(Error::Conflict(format!(
            "{} already exists; pass --force to replace it",
            path.display()
        )));
    }

    manager.save(&Config::default())?;
    formatter.success(&format!("Wrote {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_refuse_overwrite() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("s3commander").join("config.toml"));
        let formatter = Formatter::default();

        init(&manager, false, &formatter).unwrap();
        assert!(manager.config_path().exists());

        let err = init(&manager, false, &formatter).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        init(&manager, true, &formatter).unwrap();
    }

    #[test]
    fn test_show_without_file() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        show(&manager, &Formatter::default()).unwrap();
        assert!(!manager.config_path().exists());
    }

    #[test]
    fn test_show_rejects_newer_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "schema_version = 99\n").unwrap();

        let err = show(&ConfigManager::with_path(path), &Formatter::default()).unwrap_err();
        assert_eq!(ExitCode::from(&err), ExitCode::UsageError);
    }
}
