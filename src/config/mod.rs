use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::name::NamePolicy;

pub const CONFIG_FILE: &str = "config.toml";

/// How the directory tool is invoked and how its "no such group" error reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandConfig {
    pub program: String,
    pub subcommand: String,
    /// Fragment of stderr that means the requested group does not exist.
    pub not_found_marker: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: "net".to_string(),
            subcommand: "localgroup".to_string(),
            not_found_marker: "The specified local group does not exist.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub policy: NamePolicy,
    pub command: CommandConfig,
}

/// Build default config file locations in priority order:
/// 1. `.localgroup/config.toml` (resolved from CWD)
/// 2. `{config_dir}/localgroup/config.toml` (user-level, platform-native)
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".localgroup").join(CONFIG_FILE));
    }

    if let Some(config) = dirs::config_dir() {
        paths.push(config.join("localgroup").join(CONFIG_FILE));
    }

    paths
}

/// Try to load a config from `path`. Returns `Ok(None)` if the file does not
/// exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or contains invalid TOML.
pub fn try_load(path: &Path) -> anyhow::Result<Option<Config>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to read config file: {}", path.display())));
        }
    };
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(Some(config))
}

/// Load the effective config.
///
/// An explicit path must exist. Otherwise the first file found in
/// `search_paths` wins, and defaults apply when none is present.
///
/// # Errors
///
/// Returns an error if the explicit file is missing, or any file found
/// cannot be read or parsed.
pub fn load(explicit: Option<&Path>, search_paths: &[PathBuf]) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return try_load(path)?
            .ok_or_else(|| anyhow::anyhow!("config file not found: {}", path.display()));
    }
    for path in search_paths {
        if let Some(cfg) = try_load(path)? {
            tracing::debug!(path = %path.display(), "loaded config");
            return Ok(cfg);
        }
    }
    Ok(Config::default())
}
