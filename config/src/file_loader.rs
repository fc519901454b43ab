//! # Configuration File Loading
//!
//! Reads a [`Config`] from a TOML or YAML file. The format follows the file
//! extension; missing sections and fields take their defaults.

use crate::config::Config;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Cannot read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML config: {0}")]
    YamlParse(String),

    #[error("Config file has no extension")]
    NoExtension,

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String)
}

fn read(path: &Path) -> Result<String, ConfigFileError> {
    std::fs::read_to_string(path).map_err(|e| ConfigFileError::Read {
        path: path.display().to_string(),
        reason: e.to_string()
    })
}

/// ```rust,no_run
/// use config::load_from_toml;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_from_toml(Path::new("yagpt.toml"))?;
///     println!("Model: {}", config.gpt.model_uri());
///     Ok(())
/// }
/// ```
pub fn load_from_toml(path: &Path) -> Result<Config, ConfigFileError> {
    toml::from_str(&read(path)?).map_err(|e| ConfigFileError::TomlParse(e.to_string()))
}

pub fn load_from_yaml(path: &Path) -> Result<Config, ConfigFileError> {
    serde_yaml::from_str(&read(path)?).map_err(|e| ConfigFileError::YamlParse(e.to_string()))
}

/// Loads `.toml`, `.yaml` or `.yml` files.
pub fn load_from_file(path: &Path) -> Result<Config, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        _ => Err(ConfigFileError::UnsupportedFormat(extension))
    }
}
