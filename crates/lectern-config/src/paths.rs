//! Standard filesystem locations for lectern state.
//!
//! Config and credentials live under the user config directory, cached API
//! responses under the user cache directory. Both can be redirected with
//! `LECTERN_CONFIG_DIR` / `LECTERN_CACHE_DIR`, which tests rely on to keep
//! real user state untouched.

use std::path::PathBuf;

/// Directory holding `config.toml` and the persisted credential.
///
/// Resolution order:
/// 1. `LECTERN_CONFIG_DIR` environment variable
/// 2. `<platform config dir>/lectern` (e.g. `~/.config/lectern`)
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LECTERN_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lectern")
}

/// Directory holding cached API responses.
///
/// Resolution order:
/// 1. `LECTERN_CACHE_DIR` environment variable
/// 2. `<platform cache dir>/lectern` (e.g. `~/.cache/lectern`)
pub fn cache_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LECTERN_CACHE_DIR") {
        return PathBuf::from(dir);
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("lectern")
}

/// Path of the config file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Path of the persisted OAuth credential.
pub fn credential_file() -> PathBuf {
    config_dir().join("credential.json")
}

/// Directory for rotating log files.
pub fn log_dir() -> PathBuf {
    config_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_under_config_dir() {
        assert!(config_file().starts_with(config_dir()));
        assert!(credential_file().starts_with(config_dir()));
    }
}
