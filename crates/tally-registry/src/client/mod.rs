//! HTTP client implementation with connection pooling and retry logic

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};

use tally_core::error::TallyError;
use crate::catalog::{parse_simple_index, CatalogSource};
use crate::transport::{RegistryUrl, Transport, TransportResponse};
use crate::RegistryResult;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Options for building a registry client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Package index to talk to
    pub registry: RegistryUrl,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Retry configuration for connection failures
    pub retry: RetryConfig,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            registry: RegistryUrl::default(),
            timeout: Duration::from_secs(30),
            user_agent: format!("tally/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryConfig::default(),
        }
    }
}

/// HTTP client for the package index
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Package index layout
    registry: RegistryUrl,
}

impl RegistryClient {
    /// Create new registry client for the default index
    pub fn new() -> RegistryResult<Self> {
        Self::with_options(ClientOptions::default())
    }

    /// Create registry client with custom configuration
    pub fn with_options(options: ClientOptions) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            // Request timeout
            .timeout(options.timeout)
            // Enable gzip compression
            .gzip(true)
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| TallyError::network(
                format!("Failed to create HTTP client: {}", e),
                e,
            ))?;

        Ok(Self {
            client,
            retry_config: options.retry,
            registry: options.registry,
        })
    }

    /// Package index this client talks to
    pub fn registry(&self) -> &RegistryUrl {
        &self.registry
    }

    /// Execute HTTP request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    // Don't retry on final attempt or on errors a retry can't fix
                    let give_up = attempt == self.retry_config.max_retries || !error.is_recoverable();
                    last_error = Some(error);
                    if give_up {
                        break;
                    }

                    debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying request");
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64
                        ),
                        self.retry_config.max_delay
                    );
                }
            }
        }

        Err(last_error.unwrap_or_else(||
            TallyError::Network {
                message: "Retry operation failed without error".to_string(),
                source: None
            }
        ))
    }

    async fn send(&self, url: &str) -> RegistryResult<TransportResponse> {
        let response = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| TallyError::network(format!("Failed to fetch {}: {}", url, e), e))?;

        let status = response.status().as_u16();
        let body = response.bytes()
            .await
            .map_err(|e| TallyError::network(format!("Failed to read body of {}: {}", url, e), e))?
            .to_vec();

        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl Transport for RegistryClient {
    async fn get(&self, url: &str) -> RegistryResult<TransportResponse> {
        self.with_retry(|| self.send(url)).await
    }
}

#[async_trait]
impl CatalogSource for RegistryClient {
    async fn list_names(&self) -> RegistryResult<Vec<String>> {
        let url = self.registry.simple_index_url();
        let response = self.get(&url).await?;

        if !response.is_success() {
            warn!(url = %url, status = response.status, "package listing unavailable");
            return Err(TallyError::HttpStatus { url, status: response.status });
        }

        let names = parse_simple_index(&response.body)?;
        debug!(count = names.len(), "parsed package listing");
        Ok(names)
    }
}
