//! Configuration management
//!
//! Two layers live here: the on-disk configuration file
//! (`<config dir>/s3commander/config.toml`, TOML) holding user defaults, and
//! `ClientConfig`, the validated settings a remote store client is built from.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
///
/// IMPORTANT: Bumping this version requires:
/// 1. Adding a migration in `ConfigManager::migrate`
/// 2. Updating migration tests
/// 3. Marking the change as BREAKING
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "S3COMMANDER_CONFIG_DIR";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default progress style for downloads
const DEFAULT_PROGRESS: &str = "lines";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Connection and output defaults
    #[serde(default)]
    pub defaults: Defaults,

    /// Download tuning
    #[serde(default)]
    pub transfer: TransferDefaults,
}

/// Default settings applied when no flag or environment variable is given
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    /// Region used when neither --region nor AWS_REGION is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    /// Named credentials profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Use path-style bucket addressing
    #[serde(default)]
    pub force_path_style: bool,

    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,
}

/// Download tuning defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferDefaults {
    /// Size of each ranged request in bytes
    #[serde(default = "default_part_size")]
    pub part_size: u64,

    /// Number of ranged requests in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Progress style: "lines", "bar" or "none"
    #[serde(default = "default_progress")]
    pub progress: String,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_progress() -> String {
    DEFAULT_PROGRESS.to_string()
}

fn default_part_size() -> u64 {
    crate::download::DEFAULT_PART_SIZE
}

fn default_concurrency() -> usize {
    crate::download::DEFAULT_CONCURRENCY
}

impl Default for TransferDefaults {
    fn default() -> Self {
        Self {
            part_size: default_part_size(),
            concurrency: default_concurrency(),
            progress: default_progress(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults {
                output: default_output(),
                ..Default::default()
            },
            transfer: TransferDefaults::default(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager
    ///
    /// Uses `$S3COMMANDER_CONFIG_DIR/config.toml` when the variable is set,
    /// otherwise the platform config directory.
    pub fn new() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::with_path(PathBuf::from(dir).join("config.toml")));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("s3commander").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade s3commander.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        tracing::debug!(path = %self.config_path.display(), "loaded configuration");
        Ok(config)
    }

    /// Save configuration to disk, creating parent directories
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;

        // Version 0 files predate the [transfer] table; serde defaults fill it in.
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

/// Static credentials overriding the default provider chain
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Settings a remote store client is built from
///
/// Constructed with [`ClientConfig::new`], which rejects an empty region
/// before any network activity, then refined with the builder methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    region: String,
    endpoint_url: Option<String>,
    profile: Option<String>,
    credentials: Option<StaticCredentials>,
    force_path_style: bool,
}

impl ClientConfig {
    pub fn new(region: impl Into<String>) -> Result<Self> {
        let region = region.into().trim().to_string();
        if region.is_empty() {
            return Err(Error::Config(
                "No region configured. Use --region, AWS_REGION or the config file".into(),
            ));
        }

        Ok(Self {
            region,
            endpoint_url: None,
            profile: None,
            credentials: None,
            force_path_style: false,
        })
    }

    /// Send requests to a custom endpoint; the URL is validated here
    pub fn endpoint_url(mut self, endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        url::Url::parse(&endpoint)?;
        self.endpoint_url = Some(endpoint);
        Ok(self)
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn force_path_style(mut self, enabled: bool) -> Self {
        self.force_path_style = enabled;
        self
    }

    pub fn region_name(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn static_credentials(&self) -> Option<&StaticCredentials> {
        self.credentials.as_ref()
    }

    pub fn path_style(&self) -> bool {
        self.force_path_style
    }
}
