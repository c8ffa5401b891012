//! Configuration validation using JSON Schema

use crate::config::manager::ConfigManager;
use crate::config::Config;
use schemars::schema_for;
use serde_json::Value;
use std::path::Path;
use validator::Validate;

/// Validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Configuration validator
pub struct ConfigValidator {
    schema: Value,
}

impl ConfigValidator {
    /// Create a new validator with the generated schema
    pub fn new() -> Self {
        let schema = schema_for!(Config);
        Self {
            schema: serde_json::to_value(&schema).unwrap_or_default(),
        }
    }

    /// Get the JSON Schema for the configuration
    pub fn get_schema(&self) -> &Value {
        &self.schema
    }

    /// Export the schema to a JSON string
    pub fn export_schema(&self) -> String {
        serde_json::to_string_pretty(&self.schema).unwrap_or_default()
    }

    /// Validate a configuration file, including env overrides
    pub fn validate_file(&self, path: &Path) -> Result<(), Vec<ValidationError>> {
        if !path.exists() {
            return Err(vec![ValidationError {
                path: path.to_string_lossy().to_string(),
                message: "Configuration file does not exist".to_string(),
            }]);
        }

        let config: Config = ConfigManager::figment(Some(path))
            .extract()
            .map_err(|e| {
                vec![ValidationError {
                    path: "root".to_string(),
                    message: format!("Failed to load config: {}", e),
                }]
            })?;

        self.validate(&config)
    }

    /// Validate TOML content
    pub fn validate_toml(&self, content: &str) -> Result<(), Vec<ValidationError>> {
        let config: Config = toml::from_str(content).map_err(|e| {
            vec![ValidationError {
                path: "root".to_string(),
                message: format!("TOML parse error: {}", e),
            }]
        })?;

        self.validate(&config)
    }

    pub fn validate(&self, config: &Config) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(validation_errors) = config.validate() {
            for (field, field_errors) in validation_errors.errors() {
                errors.push(ValidationError {
                    path: field.to_string(),
                    message: format!("{:?}", field_errors),
                });
            }
        }

        self.validate_google_config(config, &mut errors);
        self.validate_proxy_config(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_google_config(&self, config: &Config, errors: &mut Vec<ValidationError>) {
        if config.google.client_id().is_none() {
            errors.push(ValidationError {
                path: "google.client_id".to_string(),
                message: "OAuth client id is not set; /api/config will return null".to_string(),
            });
        }

        for (path, value) in [
            ("google.sheets_base_url", &config.google.sheets_base_url),
            ("google.language_base_url", &config.google.language_base_url),
        ] {
            match url::Url::parse(value) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                _ => errors.push(ValidationError {
                    path: path.to_string(),
                    message: format!("Must be an absolute http(s) URL: {}", value),
                }),
            }
        }
    }

    fn validate_proxy_config(&self, config: &Config, errors: &mut Vec<ValidationError>) {
        for (idx, host) in config.proxy.allowed_hosts.iter().enumerate() {
            if host.trim().is_empty() {
                errors.push(ValidationError {
                    path: format!("proxy.allowed_hosts[{}]", idx),
                    message: "Allowed host cannot be empty".to_string(),
                });
            }
        }

        if config.proxy.max_response_bytes == Some(0) {
            errors.push(ValidationError {
                path: "proxy.max_response_bytes".to_string(),
                message: "Response size limit must be greater than 0".to_string(),
            });
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_flags_missing_client_id() {
        let validator = ConfigValidator::new();
        let errors = validator.validate(&Config::default()).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "google.client_id");
    }

    #[test]
    fn test_valid_toml() {
        let validator = ConfigValidator::new();
        let toml = r#"
[google]
client_id = "1234.apps.googleusercontent.com"
"#;
        assert!(validator.validate_toml(toml).is_ok());
    }

    #[test]
    fn test_empty_allowed_host() {
        let validator = ConfigValidator::new();
        let toml = r#"
[google]
client_id = "abc"

[proxy]
allowed_hosts = ["example.com", " "]
"#;

        let errors = validator.validate_toml(toml).unwrap_err();
        assert!(errors.iter().any(|e| e.path == "proxy.allowed_hosts[1]"));
    }

    #[test]
    fn test_non_http_base_url() {
        let validator = ConfigValidator::new();
        let toml = r#"
[google]
client_id = "abc"
sheets_base_url = "ftp://sheets.example.com"
"#;

        let errors = validator.validate_toml(toml).unwrap_err();
        assert!(errors.iter().any(|e| e.path == "google.sheets_base_url"));
    }

    #[test]
    fn test_zero_port_rejected() {
        let validator = ConfigValidator::new();
        let toml = r#"
[server]
port = 0

[google]
client_id = "abc"
"#;

        let errors = validator.validate_toml(toml).unwrap_err();
        assert!(errors.iter().any(|e| e.path == "server"));
    }

    #[test]
    fn test_schema_generation() {
        let validator = ConfigValidator::new();
        let schema = validator.export_schema();

        assert!(!schema.is_empty());
        assert!(schema.contains("$schema"));
        assert!(schema.contains("allowed_hosts"));
    }
}
