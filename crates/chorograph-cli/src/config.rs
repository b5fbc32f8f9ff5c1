//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use chorograph::{ChorographError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for ChorographError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingFile(_) => {
                ChorographError::Io(io::Error::new(io::ErrorKind::NotFound, err.to_string()))
            }
            ConfigError::Parse(_) | ConfigError::Validation(_) => {
                ChorographError::invalid_argument(err.to_string())
            }
        }
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (chorograph/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or fails validation
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, ChorographError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("chorograph/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "chorograph", "chorograph") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load and validate configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, ChorographError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    debug!(layers = config.layers().len(); "Configuration loaded");
    Ok(config)
}

fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .viewport()
        .validate()
        .map_err(|e| ConfigError::Validation(e.to_string()))?;

    let style = config.style();
    style
        .background_color()
        .and(style.color_range().map(|_| ()))
        .and(style.missing_color().map(|_| ()))
        .and(style.feature_stroke().map(|_| ()))
        .and(style.mesh_stroke().map(|_| ()))
        .and(style.selected_fill().map(|_| ()))
        .and(style.selected_stroke().map(|_| ()))
        .map_err(ConfigError::Validation)?;

    for layer in config.layers() {
        let layer_style = layer.style();
        layer_style
            .fill()
            .and(layer_style.stroke().map(|_| ()))
            .map_err(|e| ConfigError::Validation(format!("layer `{}`: {e}", layer.name())))?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = parse_config(
            r#"
            [viewport]
            zoom_step = 1.5
            max_scale_factor = 8.0

            [[layers]]
            name = "counties"
            type = "feature"
            "#,
        )
        .unwrap();

        assert_eq!(config.viewport().zoom_step(), 1.5);
        assert_eq!(config.viewport().max_scale_factor(), Some(8.0));
        assert_eq!(config.layers().len(), 1);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            parse_config("[viewport]\nzoom_step = 0.0"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config("[style]\nmissing_color = \"nope\""),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            parse_config("[[layers]]\nname = \"x\"\ntype = \"raster\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_selection_and_layer_style() {
        let config = parse_config(
            r#"
            [data]
            selected = ["R1", "R4"]

            [style]
            selected_fill = "gold"

            [[layers]]
            name = "coast"
            object = "regions"
            type = "mesh"

            [layers.style]
            class_name = "coastline"
            stroke = "steelblue"
            "#,
        )
        .unwrap();

        assert_eq!(config.data().selected(), ["R1", "R4"]);
        assert!(config.style().selected_fill().unwrap().is_some());
        assert_eq!(config.layers()[0].style().class_name(), Some("coastline"));

        let bad_layer = parse_config(
            "[[layers]]\nname = \"coast\"\ntype = \"mesh\"\n[layers.style]\nstroke = \"nope\"",
        );
        assert!(matches!(bad_layer, Err(ConfigError::Validation(msg)) if msg.contains("coast")));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = load_config(Some("definitely/not/here.toml"));
        assert!(matches!(result, Err(ChorographError::Io(_))));
    }
}
