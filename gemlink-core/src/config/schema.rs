//! Configuration schema structures with serde support

use super::error::ConfigError;
use super::secrets::SecretString;
use crate::providers::adapter::SafetySetting;
use serde::{Deserialize, Serialize};

/// Environment variable holding the default API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable overriding the listen host
pub const HOST_ENV: &str = "GEMLINK_HOST";
/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "GEMLINK_PORT";

/// Harm categories covered by the permissive safety preset
pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Root configuration structure for Gemlink
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GemlinkConfig {
    /// Credential used when a request carries no bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_api_key: Option<SecretString>,

    /// Upstream API settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Content-safety settings sent upstream
    #[serde(default)]
    pub safety: SafetyConfig,

    /// How failures map to HTTP status codes
    #[serde(default)]
    pub error_status: ErrorStatusPolicy,

    /// Listen address
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the generative-language API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API version path segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout; unset means no client-side timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_secs: None,
        }
    }
}

/// Safety presets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyMode {
    /// Send no safety settings; the provider's defaults apply
    #[default]
    ProviderDefault,
    /// `BLOCK_NONE` for every harm category
    Permissive,
    /// Use the explicit `settings` list
    Custom,
}

/// Content-safety configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    #[serde(default)]
    pub mode: SafetyMode,

    /// Only read in `custom` mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<SafetySetting>,
}

impl SafetyConfig {
    /// Permissive preset
    pub fn permissive() -> Self {
        Self {
            mode: SafetyMode::Permissive,
            settings: Vec::new(),
        }
    }

    /// Settings to send upstream, `None` for provider defaults
    pub fn settings(&self) -> Option<Vec<SafetySetting>> {
        match self.mode {
            SafetyMode::ProviderDefault => None,
            SafetyMode::Permissive => Some(
                HARM_CATEGORIES
                    .iter()
                    .map(|category| SafetySetting::new(*category, "BLOCK_NONE"))
                    .collect(),
            ),
            SafetyMode::Custom => Some(self.settings.clone()),
        }
    }
}

/// Mapping from failure kind to HTTP status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatusPolicy {
    /// Every failure is a 500
    #[default]
    Uniform,
    /// 400 / 401 / 429 / 502 / 500 by failure kind
    Mapped,
}

/// Listen address
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl GemlinkConfig {
    /// Build a configuration from the process environment alone
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Build a configuration from a variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = Self {
            default_api_key: get(API_KEY_ENV).map(SecretString::new),
            ..Default::default()
        };
        config.apply_env_overrides(get)?;
        Ok(config)
    }

    /// Apply listen-address overrides on top of a loaded configuration
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV) {
            self.server.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                message: format!("{} must be a port number, got '{}'", PORT_ENV, port),
            })?;
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_base_url() -> String { "https://generativelanguage.googleapis.com".to_string() }
fn default_api_version() -> String { "v1beta".to_string() }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
