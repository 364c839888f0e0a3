//! Engine configuration file handling
//!
//! One closed configuration struct per deployment, TOML-encoded, validated
//! once when loaded. Gateways, resolvers and relay services receive the parts
//! they need from a [`SdkConfig`] that never changes after construction.

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default gateway host for content-addressed metadata
const DEFAULT_METADATA_GATEWAY: &str = "ipfs.fleek.co";

/// Default page size when listing proposals and zDAOs
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for crate::error::ZdaoError {
    fn from(err: ConfigError) -> Self {
        crate::error::ZdaoError::Invalid(err.to_string())
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SdkConfig {
    /// Platform discriminator used when hashing proposals for the treasury
    #[serde(default = "default_platform_type")]
    pub platform_type: u32,

    /// Root chain (registry, proposal creation, treasury trigger)
    pub root: ChainConfig,

    /// Child chain (voting and tallying)
    pub child: ChainConfig,

    /// Checkpoint bridge polling
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Metadata gateway
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Pagination
    #[serde(default)]
    pub listing: ListingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One chain endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Registry contract on the root chain, voting contract on the child chain
    pub registry: Address,
}

/// Bridge checkpoint polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Delay between checkpoint polls (humantime, e.g. "30s")
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Upper bound on the delay when backing off (humantime)
    #[serde(default = "default_max_poll_interval")]
    pub max_poll_interval: String,

    /// Give up after this long (humantime). Waits forever when unset.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Double the delay after each negative poll, up to `max_poll_interval`
    #[serde(default)]
    pub exponential_backoff: bool,
}

/// Metadata gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataConfig {
    /// Host substituted into ipfs:// and ipns:// URIs
    #[serde(default = "default_metadata_gateway")]
    pub gateway: String,
}

/// Pagination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level or EnvFilter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_platform_type() -> u32 {
    0
}

fn default_poll_interval() -> String {
    "30s".to_string()
}

fn default_max_poll_interval() -> String {
    "5m".to_string()
}

fn default_metadata_gateway() -> String {
    DEFAULT_METADATA_GATEWAY.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_poll_interval: default_max_poll_interval(),
            timeout: None,
            exponential_backoff: false,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            gateway: default_metadata_gateway(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value)
        .map_err(|e| ConfigError::Invalid(format!("{} '{}': {}", field, value, e)))
}

impl BridgeConfig {
    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("bridge.poll_interval", &self.poll_interval)
    }

    pub fn max_poll_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration("bridge.max_poll_interval", &self.max_poll_interval)
    }

    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.timeout
            .as_deref()
            .map(|t| parse_duration("bridge.timeout", t))
            .transpose()
    }
}

impl SdkConfig {
    /// Create a configuration for two chains with defaults everywhere else
    pub fn new(root: ChainConfig, child: ChainConfig) -> Self {
        Self {
            platform_type: default_platform_type(),
            root,
            child,
            bridge: BridgeConfig::default(),
            metadata: MetadataConfig::default(),
            listing: ListingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Check every field that can be wrong independent of the network
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, chain) in [("root", &self.root), ("child", &self.child)] {
            if chain.rpc_url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{}.rpc_url is empty", name)));
            }
            if chain.registry.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "{}.registry is the zero address",
                    name
                )));
            }
        }

        if self.root.chain_id == self.child.chain_id {
            return Err(ConfigError::Invalid(
                "root and child chain ids must differ".to_string(),
            ));
        }

        let poll = self.bridge.poll_interval()?;
        if poll.is_zero() {
            return Err(ConfigError::Invalid(
                "bridge.poll_interval must be non-zero".to_string(),
            ));
        }
        if self.bridge.max_poll_interval()? < poll {
            return Err(ConfigError::Invalid(
                "bridge.max_poll_interval is shorter than bridge.poll_interval".to_string(),
            ));
        }
        self.bridge.timeout()?;

        if self.metadata.gateway.trim().is_empty() || self.metadata.gateway.contains("://") {
            return Err(ConfigError::Invalid(format!(
                "metadata.gateway must be a bare host, got '{}'",
                self.metadata.gateway
            )));
        }

        if self.listing.page_size == 0 {
            return Err(ConfigError::Invalid(
                "listing.page_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: SdkConfig = toml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }

        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;

        Ok(())
    }

    /// Generate commented default configuration content
    pub fn generate_default_toml() -> String {
        format!(
            r#"# zdao-sync configuration
#
# Contract addresses are hex with 0x prefix. Durations use humantime
# notation ("30s", "5m", "2h").

platform_type = 0

[root]
rpc_url = "https://mainnet.infura.io/v3/<key>"
chain_id = 1
registry = "0x0000000000000000000000000000000000000001"

[child]
rpc_url = "https://polygon-rpc.com"
chain_id = 137
registry = "0x0000000000000000000000000000000000000002"

[bridge]
poll_interval = "30s"
max_poll_interval = "5m"
exponential_backoff = false
# Leave unset to wait until cancelled
# timeout = "3h"

[metadata]
gateway = "{gateway}"

[listing]
page_size = {page_size}

[logging]
# Log level or EnvFilter directive, overridden by RUST_LOG
level = "{level}"
"#,
            gateway = DEFAULT_METADATA_GATEWAY,
            page_size = DEFAULT_PAGE_SIZE,
            level = DEFAULT_LOG_LEVEL,
        )
    }
}
