//! Transport abstraction and registry URL layout

use async_trait::async_trait;
use tally_core::error::TallyError;
use url::Url;

use crate::RegistryResult;

/// Default package index
pub const DEFAULT_REGISTRY_URL: &str = "https://pypi.org";

/// Raw response of a single GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single HTTP GET.
///
/// Non-success statuses are returned as responses. Only failures to obtain a
/// response at all (DNS, connection, timeout) are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> RegistryResult<TransportResponse>;
}

/// Base URL of a package index and the paths tally reads from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryUrl {
    base: Url,
}

impl RegistryUrl {
    /// Parse a base URL; only http and https are accepted
    pub fn parse(raw: &str) -> RegistryResult<Self> {
        let base = Url::parse(raw).map_err(|e| TallyError::ConfigValidation {
            field: "registry.url".to_string(),
            reason: format!("'{}' is not a valid URL: {}", raw, e),
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(TallyError::ConfigValidation {
                field: "registry.url".to_string(),
                reason: format!("unsupported scheme '{}'", base.scheme()),
            });
        }

        Ok(Self { base })
    }

    /// Base URL without a trailing slash
    pub fn as_str(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Plain listing of every project name
    pub fn simple_index_url(&self) -> String {
        format!("{}/simple/", self.as_str())
    }

    /// JSON metadata document for one project.
    ///
    /// The name is percent-encoded as a single path segment.
    pub fn metadata_url(&self, name: &str) -> String {
        let mut url = self.base.clone();
        // http(s) URLs always have a path
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["pypi", name, "json"]);
        }
        url.into()
    }
}

impl Default for RegistryUrl {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_REGISTRY_URL).expect("default registry URL is valid"),
        }
    }
}
