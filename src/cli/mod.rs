//! CLI command implementations

pub mod args;

use crate::cli::args::{OutputFormat, SchemaArgs, ServeArgs, ValidateArgs};
use crate::config::{Config, ConfigManager, ConfigValidator};
use anyhow::Context;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Expand tilde in path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Load the layered config and apply command-line overrides on top.
pub fn load_serve_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let manager = ConfigManager::new(args.config.as_deref())?;
    let mut config = manager.get_config();

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json = true;
    }
    if let Some(dir) = &args.assets {
        config.assets.dir = dir.clone();
    }

    Ok(config)
}

/// Render the validation report. Returns whether the file is valid.
pub fn validate(args: &ValidateArgs) -> (bool, String) {
    let path = expand_path(&args.config);
    let result = ConfigValidator::new().validate_file(&path);

    let report = match (args.format, &result) {
        (OutputFormat::Text, Ok(())) => format!("{}: configuration is valid", path.display()),
        (OutputFormat::Text, Err(errors)) => {
            let mut lines = vec![format!(
                "{}: {} problem(s) found",
                path.display(),
                errors.len()
            )];
            lines.extend(errors.iter().map(|e| format!("  - {}", e)));
            lines.join("\n")
        }
        (OutputFormat::Json, result) => {
            let errors: Vec<_> = result
                .as_ref()
                .err()
                .map(|errors| {
                    errors
                        .iter()
                        .map(|e| json!({ "path": e.path, "message": e.message }))
                        .collect()
                })
                .unwrap_or_default();
            json!({
                "file": path.display().to_string(),
                "valid": result.is_ok(),
                "errors": errors,
            })
            .to_string()
        }
    };

    (result.is_ok(), report)
}

pub fn schema(args: &SchemaArgs) -> anyhow::Result<Option<String>> {
    let schema = ConfigValidator::new().export_schema();
    match &args.output {
        Some(path) => {
            write_file(path, &schema)?;
            Ok(None)
        }
        None => Ok(Some(schema)),
    }
}

fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
