//! Configuration file and layered resolution
//!
//! Everything optional or layered is resolved once here, before any
//! [`WorkItem`] exists: per-item bundle ids fall back to the root value and
//! credentials from the environment override the file.

use crate::error::{Error, Result};
use crate::issues::SuppressionRule;
use crate::notarize::PollIntervals;
use crate::notary::Credentials;
use crate::types::WorkItem;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `apple_id.username`
pub const ENV_USERNAME: &str = "AC_USERNAME";
/// Environment variable overriding `apple_id.password`
pub const ENV_PASSWORD: &str = "AC_PASSWORD";
/// Environment variable overriding `apple_id.provider`
pub const ENV_PROVIDER: &str = "AC_PROVIDER";

/// Parsed configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default bundle id for every item
    pub bundle_id: Option<String>,
    /// Suppress log issues whose path matches this regex
    pub ignore_path_issues: Option<String>,
    /// Account credentials
    #[serde(default)]
    pub apple_id: AppleIdConfig,
    /// Files to notarize
    #[serde(default)]
    pub notarize: Vec<NotarizeConfig>,
    /// Poll interval overrides
    #[serde(default)]
    pub poll: PollConfig,
    /// External tool overrides
    #[serde(default)]
    pub tool: ToolConfig,
}

/// `[apple_id]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppleIdConfig {
    /// Apple ID
    pub username: Option<String>,
    /// Password or `@keychain:`/`@env:` reference
    pub password: Option<String>,
    /// Provider short name
    pub provider: Option<String>,
}

/// `[[notarize]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotarizeConfig {
    /// Artifact to submit
    pub path: PathBuf,
    /// Bundle id override
    pub bundle_id: Option<String>,
    /// Staple after notarization
    #[serde(default)]
    pub staple: bool,
}

/// `[poll]` table
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PollConfig {
    /// Seconds between queries until the request is acknowledged
    pub slow_interval_secs: u64,
    /// Seconds between queries afterwards
    pub fast_interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        let defaults = PollIntervals::default();
        Self {
            slow_interval_secs: defaults.slow.as_secs(),
            fast_interval_secs: defaults.fast.as_secs(),
        }
    }
}

/// `[tool]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Path to `xcrun`
    pub xcrun: Option<PathBuf>,
}

/// Everything the core needs, fully resolved
#[derive(Debug)]
pub struct Settings {
    /// One item per `[[notarize]]` entry, in file order
    pub items: Vec<WorkItem>,
    /// Resolved credentials
    pub credentials: Credentials,
    /// Compiled suppression rule
    pub suppression: Option<SuppressionRule>,
    /// Poll intervals
    pub intervals: PollIntervals,
    /// Executable used for the notary and stapler tools
    pub xcrun: PathBuf,
}

impl Config {
    /// Parse TOML configuration
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    /// Validate and resolve against the process environment
    pub fn resolve(&self) -> Result<Settings> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Validate and resolve, looking up environment overrides with `env`
    pub fn resolve_with<F>(&self, env: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.notarize.is_empty() {
            return Err(Error::Config(
                "at least one [[notarize]] entry is required".to_string(),
            ));
        }

        let items = self
            .notarize
            .iter()
            .map(|entry| self.resolve_item(entry))
            .collect::<Result<Vec<_>>>()?;

        let suppression = self
            .ignore_path_issues
            .as_deref()
            .map(SuppressionRule::new)
            .transpose()?;

        if self.poll.slow_interval_secs == 0 || self.poll.fast_interval_secs == 0 {
            return Err(Error::Config("poll intervals must be positive".to_string()));
        }

        Ok(Settings {
            items,
            credentials: self.resolve_credentials(&env)?,
            suppression,
            intervals: PollIntervals {
                slow: Duration::from_secs(self.poll.slow_interval_secs),
                fast: Duration::from_secs(self.poll.fast_interval_secs),
            },
            xcrun: self
                .tool
                .xcrun
                .clone()
                .unwrap_or_else(|| PathBuf::from("xcrun")),
        })
    }

    fn resolve_item(&self, entry: &NotarizeConfig) -> Result<WorkItem> {
        if entry.path.as_os_str().is_empty() {
            return Err(Error::Config("notarize entry with empty path".to_string()));
        }
        let bundle_id = entry
            .bundle_id
            .as_ref()
            .or(self.bundle_id.as_ref())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "no bundle_id for {}: set it on the entry or at the root",
                    entry.path.display()
                ))
            })?;
        Ok(WorkItem::new(&entry.path, bundle_id, entry.staple))
    }

    fn resolve_credentials<F>(&self, env: &F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let layered = |key: &str, file: Option<&String>| {
            env(key)
                .filter(|v| !v.is_empty())
                .or_else(|| file.cloned())
        };

        let username = layered(ENV_USERNAME, self.apple_id.username.as_ref()).ok_or_else(|| {
            Error::Config(format!("apple_id.username or {ENV_USERNAME} is required"))
        })?;
        let password = layered(ENV_PASSWORD, self.apple_id.password.as_ref()).ok_or_else(|| {
            Error::Config(format!("apple_id.password or {ENV_PASSWORD} is required"))
        })?;

        Ok(Credentials {
            username,
            password,
            provider: layered(ENV_PROVIDER, self.apple_id.provider.as_ref()),
        })
    }
}
