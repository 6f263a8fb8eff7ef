//! Configuration module for Gemlink
//!
//! This module provides the configuration schema, loading and validation.
//! A configuration comes either from a YAML/JSON file (with `${VAR}`
//! interpolation) or from environment variables alone.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{interpolate_env_vars, interpolate_with};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ErrorStatusPolicy, GemlinkConfig, SafetyConfig, SafetyMode, ServerConfig, UpstreamConfig,
    API_KEY_ENV, HARM_CATEGORIES, HOST_ENV, PORT_ENV,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<GemlinkConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: GemlinkConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<GemlinkConfig> {
    let path = path.as_ref();
    let interpolated = read_interpolated(path)?;

    let config: GemlinkConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration file, picking the format from its extension
pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<GemlinkConfig> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_from_yaml(path),
        Some("json") => load_from_json(path),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_string_lossy().to_string(),
        }),
    }
}

/// Read a file and interpolate environment variables before parsing
fn read_interpolated(path: &Path) -> ConfigResult<String> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    interpolate_env_vars(&content)
}
