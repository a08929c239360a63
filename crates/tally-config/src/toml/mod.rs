//! tally.toml configuration parsing and serialization

use serde::{Deserialize, Serialize};
use tally_core::error::TallyError;
use crate::ConfigResult;

/// Default package index
pub const DEFAULT_REGISTRY_URL: &str = "https://pypi.org";

/// Default number of concurrent metadata requests
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Complete tally.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TallyToml {
    /// Package index settings
    #[serde(default)]
    pub registry: RegistrySection,

    /// Catalog fetch settings
    #[serde(default)]
    pub fetch: FetchSection,
}

/// Package index section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RegistrySection {
    /// Base URL of the package index
    pub url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retries of a request that failed to connect
    pub max_retries: u32,

    /// User agent override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            user_agent: None,
        }
    }
}

/// Catalog fetch section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchSection {
    /// Metadata requests in flight at once
    pub concurrency: usize,

    /// Extra passes over unresolved packages after the first full fetch
    pub retry_passes: u32,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry_passes: 1,
        }
    }
}

/// Parse TOML string to TallyToml configuration
pub fn parse_tally_toml(content: &str) -> ConfigResult<TallyToml> {
    let config: TallyToml = toml::from_str(content)
        .map_err(|e| TallyError::TomlParse { message: e.to_string() })?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize TallyToml to TOML string
pub fn serialize_tally_toml(config: &TallyToml) -> ConfigResult<String> {
    toml::to_string_pretty(config)
        .map_err(|e| TallyError::TomlParse { message: format!("TOML serialization error: {}", e) })
}

/// Validate configuration values
pub fn validate_config(config: &TallyToml) -> ConfigResult<()> {
    let url = url::Url::parse(&config.registry.url).map_err(|e| TallyError::ConfigValidation {
        field: "registry.url".to_string(),
        reason: format!("'{}' is not a valid URL: {}", config.registry.url, e),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TallyError::ConfigValidation {
            field: "registry.url".to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if config.registry.timeout_secs == 0 {
        return Err(TallyError::ConfigValidation {
            field: "registry.timeout-secs".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if config.fetch.concurrency == 0 {
        return Err(TallyError::ConfigValidation {
            field: "fetch.concurrency".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Load and parse tally.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<TallyToml> {
    let content = tokio::fs::read_to_string(path).await
        .map_err(|e| TallyError::io(format!("Failed to read {}", path), e))?;

    parse_tally_toml(&content)
        .map_err(|e| match e {
            TallyError::TomlParse { message } => TallyError::TomlParse {
                message: format!("In file {}: {}", path, message),
            },
            other => other,
        })
}
