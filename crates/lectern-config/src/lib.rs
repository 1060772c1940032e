//! Configuration system for the lectern classroom client.
//!
//! Loads `config.toml` from the lectern config directory, falling back to
//! defaults for anything unspecified. Path resolution and environment
//! overrides live in [`paths`] and on the individual settings types.

mod error;
pub mod paths;
mod settings;

use std::path::Path;

pub use error::{ConfigError, Result};
pub use settings::{ApiSettings, CacheSettings, LecternConfig, OAuthSettings};

/// Load configuration from the default location.
///
/// A missing file is not an error; defaults apply.
pub fn load() -> Result<LecternConfig> {
    load_from(&paths::config_file())
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<LecternConfig> {
    if !path.exists() {
        return Ok(LecternConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
