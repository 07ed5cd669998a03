use std::env;
use std::path::PathBuf;

/// Storage configuration.
///
/// The data directory comes from the `DAYTRACK_DATA_DIR` environment
/// variable when set, otherwise the platform data directory
/// (`~/.local/share/daytrack` on Linux).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the day and weekly documents.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Environment variable that overrides the data directory.
    pub const ENV_VAR: &str = "DAYTRACK_DATA_DIR";

    /// Data directory named by `DAYTRACK_DATA_DIR`, if set.
    pub fn env_data_dir() -> Option<PathBuf> {
        env::var_os(Self::ENV_VAR).map(PathBuf::from)
    }

    /// Build a config from an explicit directory (useful for tests and CLI flags).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Platform data directory joined with `daytrack`.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("daytrack")
    }
}
