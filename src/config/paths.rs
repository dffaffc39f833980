//! Path utilities for Autotile.
//!
//! Defines standard locations for configuration and logs.

use std::path::PathBuf;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "AUTOTILE_CONFIG";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "autotile", "autotile")
}

/// Configuration directory.
///
/// On Windows: `%APPDATA%\autotile\autotile\config`
/// On Linux: `~/.config/autotile`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
                .join("autotile")
        })
}

/// Base data directory.
///
/// On Windows: `%LOCALAPPDATA%\autotile\autotile\data`
/// On Linux: `~/.local/share/autotile`
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
                .join("autotile")
        })
}

/// Configuration file path.
pub fn config_file() -> PathBuf {
    // Check environment variable first
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_dir().join("config.toml")
}

/// Log directory, created on demand.
pub fn log_dir() -> std::io::Result<PathBuf> {
    let path = data_dir().join("logs");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_lives_in_config_dir() {
        if std::env::var(CONFIG_ENV).is_err() {
            assert_eq!(config_file(), config_dir().join("config.toml"));
        }
    }
}
