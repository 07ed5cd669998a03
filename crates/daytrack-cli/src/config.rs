//! Configuration file management for daytrack.
//!
//! Provides a TOML-based config file at `~/.config/daytrack/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use daytrack_store::StoreConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3210;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory holding the day and weekly Markdown documents.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the daytrack config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/daytrack` or `~/.config/daytrack`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("daytrack");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("daytrack")
}

/// Return the path to the daytrack config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file at `path`. A missing file is `Ok(None)`; a file
/// that exists but does not parse is an error.
pub fn load_config_from(path: &Path) -> Result<Option<ConfigFile>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

pub fn load_config() -> Result<Option<ConfigFile>> {
    load_config_from(&config_path())
}

/// Serialize and write the config file to `path`, creating parent dirs.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line, highest priority.
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub data_dir: Option<&'a Path>,
    pub bind: Option<&'a str>,
    pub port: Option<u16>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct DaytrackConfig {
    pub store: StoreConfig,
    pub bind: String,
    pub port: u16,
}

impl DaytrackConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Data dir: `--data-dir` > `DAYTRACK_DATA_DIR` > `storage.data_dir` > platform data dir
    /// - Bind: `--bind` > `DAYTRACK_BIND` > `server.bind` > `127.0.0.1`
    /// - Port: `--port` > `DAYTRACK_PORT` > `server.port` > `3210`
    pub fn resolve(cli: &CliOverrides<'_>) -> Result<Self> {
        let file_config = load_config()?.unwrap_or_default();
        Self::resolve_with(cli, file_config)
    }

    pub fn resolve_with(cli: &CliOverrides<'_>, file: ConfigFile) -> Result<Self> {
        let data_dir = if let Some(dir) = cli.data_dir {
            dir.to_path_buf()
        } else if let Some(dir) = StoreConfig::env_data_dir() {
            dir
        } else if let Some(dir) = file.storage.data_dir {
            dir
        } else {
            StoreConfig::default_data_dir()
        };

        let bind = if let Some(bind) = cli.bind {
            bind.to_owned()
        } else if let Ok(bind) = std::env::var("DAYTRACK_BIND") {
            bind
        } else {
            file.server.bind.unwrap_or_else(|| DEFAULT_BIND.to_owned())
        };

        let port = if let Some(port) = cli.port {
            port
        } else if let Ok(port) = std::env::var("DAYTRACK_PORT") {
            port.parse()
                .with_context(|| format!("DAYTRACK_PORT is not a valid port: {port:?}"))?
        } else {
            file.server.port.unwrap_or(DEFAULT_PORT)
        };

        Ok(Self {
            store: StoreConfig::new(data_dir),
            bind,
            port,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
