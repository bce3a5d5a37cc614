//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Outcome of one environment override.
///
/// Loading happens before logging is installed, so outcomes are returned
/// and logged by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOverride {
    Applied {
        var: &'static str,
        value: String,
    },
    Ignored {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl EnvOverride {
    pub fn log(&self) {
        match self {
            EnvOverride::Applied { var, value } => {
                tracing::info!(var = *var, value = %value, "Environment override applied")
            }
            EnvOverride::Ignored { var, value, reason } => {
                tracing::warn!(
                    var = *var,
                    value = %value,
                    reason = %reason,
                    "Ignoring invalid environment override"
                )
            }
        }
    }
}

/// Load the configuration for the running process.
///
/// Starts from the file when one is given (defaults otherwise), then applies
/// `PORT`, `RELIEF_ENV` and `DATABASE_ADDR` from the environment and
/// validates the result.
pub fn load_runtime_config(
    path: Option<&Path>,
) -> Result<(AppConfig, Vec<EnvOverride>), ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    let overrides = apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok((config, overrides))
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Vec<EnvOverride>
where
    F: Fn(&str) -> Option<String>,
{
    let mut outcomes = Vec::new();

    if let Some(port) = lookup("PORT") {
        match port.trim().parse::<u16>() {
            Ok(parsed) => {
                let host = config
                    .listener
                    .bind_address
                    .rsplit_once(':')
                    .map(|(host, _)| host.to_string())
                    .unwrap_or_else(|| "0.0.0.0".to_string());
                config.listener.bind_address = format!("{}:{}", host, parsed);
                outcomes.push(EnvOverride::Applied { var: "PORT", value: port });
            }
            Err(e) => outcomes.push(EnvOverride::Ignored {
                var: "PORT",
                value: port,
                reason: e.to_string(),
            }),
        }
    }

    if let Some(env) = lookup("RELIEF_ENV") {
        match env.parse() {
            Ok(environment) => {
                config.environment = environment;
                outcomes.push(EnvOverride::Applied { var: "RELIEF_ENV", value: env });
            }
            Err(reason) => outcomes.push(EnvOverride::Ignored {
                var: "RELIEF_ENV",
                value: env,
                reason,
            }),
        }
    }

    if let Some(addr) = lookup("DATABASE_ADDR") {
        let addr = addr.trim();
        if !addr.is_empty() {
            config.health.database_address = Some(addr.to_string());
            outcomes.push(EnvOverride::Applied {
                var: "DATABASE_ADDR",
                value: addr.to_string(),
            });
        }
    }

    outcomes
}
