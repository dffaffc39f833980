//! Config command - configuration utilities.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::ConfigAction;
use crate::config::{self, Config};

/// Run the config command.
pub fn run(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Validate => validate_config(explicit),
        ConfigAction::Show => show_config(explicit),
        ConfigAction::Path => show_path(explicit),
    }
}

fn validate_config(explicit: Option<&Path>) -> Result<()> {
    let config_path = resolve(explicit);

    println!();
    println!("Validating configuration...");
    println!("Path: {}", config_path.display());
    println!();

    if explicit.is_none() && !config_path.exists() {
        println!("No configuration file; built-in defaults apply.");
        println!();
        return Ok(());
    }

    let config = Config::load(Some(&config_path))?;
    println!("Configuration is valid.");
    println!();
    println!("Summary:");
    println!("  Window manager: {}", config.bridge.url);
    println!("  Tiling threshold: {}", config.bridge.tiling_threshold);
    println!(
        "  Reconnect: {}",
        if config.bridge.reconnect.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!();
    Ok(())
}

/// Print the effective configuration, defaults included.
fn show_config(explicit: Option<&Path>) -> Result<()> {
    let config = Config::load(explicit)?;
    let rendered =
        toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

fn show_path(explicit: Option<&Path>) -> Result<()> {
    println!("{}", resolve(explicit).display());
    Ok(())
}

fn resolve(explicit: Option<&Path>) -> std::path::PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config::paths::config_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_reports_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[bridge]\ntiling_threshold = 2.0").unwrap();

        assert!(validate_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_validate_and_show_accept_good_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[bridge]\ntiling_threshold = 0.4").unwrap();

        validate_config(Some(file.path())).unwrap();
        show_config(Some(file.path())).unwrap();
    }
}
