//! Format-agnostic configuration loading

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Load a configuration file.
///
/// Format is detected from file extension:
/// - `.toml` -> TOML
/// - `.json` -> JSON
/// - `.yaml`, `.yml` -> YAML
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let parse_error = |format: &str, message: String| Error::ConfigParse {
        path: path.to_path_buf(),
        format: format.into(),
        message,
    };

    match extension.as_str() {
        "toml" => toml::from_str(&content).map_err(|e| parse_error("TOML", e.to_string())),
        "json" => serde_json::from_str(&content).map_err(|e| parse_error("JSON", e.to_string())),
        "yaml" | "yml" => {
            serde_yaml::from_str(&content).map_err(|e| parse_error("YAML", e.to_string()))
        }
        _ => Err(Error::UnsupportedFormat {
            extension: extension.clone(),
        }),
    }
}
