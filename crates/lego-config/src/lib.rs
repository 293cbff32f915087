//! Configuration management for Skills Lego.
//!
//! Settings are layered, lowest to highest priority:
//! 1. Built-in defaults
//! 2. User config: `~/.lego/config.toml`
//! 3. Project config: `.lego/config.toml` in the working directory
//! 4. An explicit file passed on the command line
//! 5. Environment variables: `LEGO_<SECTION>__<KEY>` (e.g. `LEGO_FETCH__TIMEOUT_SECS`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User-level config file location
const USER_CONFIG_PATH: &str = "~/.lego/config.toml";

/// Project-level config file location (relative to the working directory)
const PROJECT_CONFIG_PATH: &str = ".lego/config.toml";

/// Prefix for environment overrides
const ENV_PREFIX: &str = "LEGO";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub compose: ComposeConfig,
}

/// Settings for retrieving skill sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Version-control executable used for cloning
    #[serde(default = "default_git_command")]
    pub git_command: String,
    /// Branch tried once when cloning the default branch fails
    #[serde(default = "default_fallback_branch")]
    pub fallback_branch: String,
    /// Upper bound for each git invocation, in seconds. 0 disables the limit.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Clone depth
    #[serde(default = "default_depth")]
    pub depth: u32,
}

fn default_git_command() -> String {
    "git".to_string()
}

fn default_fallback_branch() -> String {
    "master".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_depth() -> u32 {
    1
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            git_command: default_git_command(),
            fallback_branch: default_fallback_branch(),
            timeout_secs: default_timeout_secs(),
            depth: default_depth(),
        }
    }
}

impl FetchConfig {
    /// Timeout for a single git invocation, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

/// What to do when two identifiers resolve to the same skill directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Abort the composition before anything is fetched
    #[default]
    Fail,
    /// Append `-2`, `-3`, ... to later duplicates
    Suffix,
}

/// Settings for composite generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Maximum number of merged triggers in the composite header
    #[serde(default = "default_max_triggers")]
    pub max_triggers: usize,
    /// Width of the description column in the included-skills table
    #[serde(default = "default_description_width")]
    pub description_width: usize,
    #[serde(default)]
    pub collision: CollisionPolicy,
}

fn default_max_triggers() -> usize {
    10
}

fn default_description_width() -> usize {
    50
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            max_triggers: default_max_triggers(),
            description_width: default_description_width(),
            collision: CollisionPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default locations plus an optional explicit file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut files = vec![expand_tilde(USER_CONFIG_PATH), PathBuf::from(PROJECT_CONFIG_PATH)];
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            files.push(path.to_path_buf());
        }
        Self::load_layers(&files)
    }

    /// Load configuration from the given files (lowest priority first) and the environment.
    /// Missing files are skipped.
    pub fn load_layers(files: &[PathBuf]) -> Result<Self> {
        let mut builder = config::Config::builder();
        for file in files {
            builder = builder.add_source(config::File::from(file.as_path()).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build().context("Failed to read configuration")?;
        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}

/// Expand tilde in path to home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path.starts_with('~') && dirs::home_dir().is_none() {
        return PathBuf::from(path);
    }
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.fetch.git_command, "git");
        assert_eq!(config.fetch.fallback_branch, "master");
        assert_eq!(config.fetch.timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.compose.max_triggers, 10);
        assert_eq!(config.compose.description_width, 50);
        assert_eq!(config.compose.collision, CollisionPolicy::Fail);
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let fetch = FetchConfig {
            timeout_secs: 0,
            ..FetchConfig::default()
        };
        assert!(fetch.timeout().is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[compose]\ncollision = \"suffix\"\n").unwrap();

        let config = Config::load_layers(&[path]).unwrap();
        assert_eq!(config.compose.collision, CollisionPolicy::Suffix);
        // Unset keys keep their defaults
        assert_eq!(config.compose.max_triggers, 10);
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn test_later_layers_override_earlier() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("user.toml");
        let project = temp.path().join("project.toml");
        std::fs::write(&user, "[fetch]\ntimeout_secs = 10\nfallback_branch = \"trunk\"\n").unwrap();
        std::fs::write(&project, "[fetch]\ntimeout_secs = 20\n").unwrap();

        let config = Config::load_layers(&[user, project]).unwrap();
        assert_eq!(config.fetch.timeout_secs, 20);
        assert_eq!(config.fetch.fallback_branch, "trunk");
    }

    #[test]
    fn test_missing_layers_are_skipped() {
        let config = Config::load_layers(&[PathBuf::from("/nonexistent/lego.toml")]).unwrap();
        assert_eq!(config.compose, ComposeConfig::default());
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let err = Config::load(Some(Path::new("/nonexistent/explicit.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let rendered = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(rendered.contains("[fetch]"));
        assert!(rendered.contains("collision = \"fail\""));
        let value: serde_json::Value = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(value["compose"]["max_triggers"], 10);
    }
}
