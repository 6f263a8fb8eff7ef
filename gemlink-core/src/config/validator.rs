//! Configuration validation utilities

use super::error::{ValidationError, ValidationErrorKind};
use super::schema::{GemlinkConfig, SafetyMode};
use url::Url;

/// Configuration validator
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration
    pub fn validate(&self, config: &GemlinkConfig) -> Result<(), ValidationError> {
        self.validate_credential(config)?;
        self.validate_upstream(config)?;
        self.validate_safety(config)?;
        Ok(())
    }

    /// A configured default key must not be blank
    fn validate_credential(&self, config: &GemlinkConfig) -> Result<(), ValidationError> {
        if let Some(key) = &config.default_api_key {
            if key.expose_secret().trim().is_empty() {
                return Err(ValidationError::required("default_api_key")
                    .with_context("omit the field instead of leaving it empty"));
            }
        }
        Ok(())
    }

    fn validate_upstream(&self, config: &GemlinkConfig) -> Result<(), ValidationError> {
        let upstream = &config.upstream;

        let url = Url::parse(&upstream.base_url).map_err(|e| {
            ValidationError::new(
                "upstream.base_url",
                ValidationErrorKind::InvalidUrl {
                    message: e.to_string(),
                },
            )
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ValidationError::invalid_value(
                "upstream.base_url",
                "http or https scheme",
                url.scheme(),
            ));
        }

        let version = upstream.api_version.trim();
        if version.is_empty() || version.contains('/') {
            return Err(ValidationError::invalid_value(
                "upstream.api_version",
                "a single path segment such as v1beta",
                upstream.api_version.as_str(),
            ));
        }

        if upstream.timeout_secs == Some(0) {
            return Err(ValidationError::out_of_range(
                "upstream.timeout_secs",
                "timeout must be at least 1 second; omit it to disable",
            ));
        }

        Ok(())
    }

    fn validate_safety(&self, config: &GemlinkConfig) -> Result<(), ValidationError> {
        let safety = &config.safety;
        match safety.mode {
            SafetyMode::Custom if safety.settings.is_empty() => Err(ValidationError::required(
                "safety.settings",
            )
            .with_context("custom safety mode requires at least one setting")),
            SafetyMode::ProviderDefault | SafetyMode::Permissive if !safety.settings.is_empty() => {
                Err(ValidationError::new(
                    "safety.settings",
                    ValidationErrorKind::Incompatible {
                        message: "settings are only used with mode: custom".to_string(),
                    },
                ))
            }
            _ => {
                for (i, setting) in safety.settings.iter().enumerate() {
                    if setting.category.trim().is_empty() {
                        return Err(ValidationError::required(format!(
                            "safety.settings[{}].category",
                            i
                        )));
                    }
                    if setting.threshold.trim().is_empty() {
                        return Err(ValidationError::required(format!(
                            "safety.settings[{}].threshold",
                            i
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}
