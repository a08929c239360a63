//! Configuration layering, fallback logic, and environment overrides

use std::collections::HashMap;
use camino::{Utf8Path, Utf8PathBuf};
use tally_core::error::TallyError;
use crate::toml::{load_from_file, validate_config, TallyToml};
use crate::ConfigResult;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "tally.toml";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Environment and command line overrides applied on top of a file
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Explicit path given on the command line
    Explicit(Utf8PathBuf),
    /// Project tally.toml file
    Project(Utf8PathBuf),
    /// Global config file
    Global(Utf8PathBuf),
    /// Built-in defaults
    Defaults,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load configuration: explicit path, else project file, else global file, else defaults
    pub async fn load(&self, explicit: Option<&Utf8Path>) -> ConfigResult<(TallyToml, ConfigSource)> {
        if let Some(path) = explicit {
            let config = load_from_file(path).await?;
            return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
        }

        if let Some(found) = self.load_project_config().await? {
            return Ok(found);
        }

        if let Some(found) = self.load_global_config().await? {
            return Ok(found);
        }

        Ok((TallyToml::default(), ConfigSource::Defaults))
    }

    /// Load the nearest tally.toml walking up from the working directory
    pub async fn load_project_config(&self) -> ConfigResult<Option<(TallyToml, ConfigSource)>> {
        match self.resolve_config_path(CONFIG_FILE) {
            Some(path) => {
                let config = load_from_file(&path).await?;
                Ok(Some((config, ConfigSource::Project(path))))
            }
            None => Ok(None),
        }
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = self.cwd.as_path();

        loop {
            let config_path = current.join(filename);
            if config_path.exists() {
                return Some(config_path);
            }

            // Move up one directory
            current = current.parent()?;
        }
    }

    /// Load global configuration from ~/.tally/config.toml
    pub async fn load_global_config(&self) -> ConfigResult<Option<(TallyToml, ConfigSource)>> {
        let Some(home_dir) = dirs::home_dir() else {
            return Ok(None);
        };

        let global_config_path = Utf8PathBuf::try_from(home_dir)
            .map_err(|e| TallyError::ConfigValidation {
                field: "home_dir".to_string(),
                reason: format!("Invalid home directory path: {}", e),
            })?
            .join(".tally")
            .join("config.toml");

        if global_config_path.exists() {
            let config = load_from_file(&global_config_path).await?;
            Ok(Some((config, ConfigSource::Global(global_config_path))))
        } else {
            Ok(None)
        }
    }
}

impl ConfigLayering {
    /// Apply environment overrides, then command line overrides, then validate
    pub fn merge_configs(
        base: TallyToml,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &HashMap<String, String>,
    ) -> ConfigResult<TallyToml> {
        let mut merged = base;

        Self::apply_env_overrides(&mut merged, env_overrides)?;

        // CLI flags have the highest priority
        Self::apply_cli_overrides(&mut merged, cli_overrides)?;

        validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut TallyToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "TALLY_REGISTRY_URL" => config.registry.url = value.clone(),
                "TALLY_CONCURRENCY" => config.fetch.concurrency = parse_number(key, value)?,
                "TALLY_TIMEOUT_SECS" => config.registry.timeout_secs = parse_number(key, value)?,
                "TALLY_RETRY_PASSES" => config.fetch.retry_passes = parse_number(key, value)?,
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut TallyToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "registry" => config.registry.url = value.clone(),
                "concurrency" => config.fetch.concurrency = parse_number(key, value)?,
                "retry-passes" => config.fetch.retry_passes = parse_number(key, value)?,
                _ => {
                    // Unknown CLI override, ignore
                }
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("TALLY_"))
            .collect()
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| TallyError::ConfigValidation {
        field: field.to_string(),
        reason: format!("'{}' is not a valid number: {}", value, e),
    })
}
