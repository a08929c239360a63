//! Command implementations and dispatch logic.
//!
//! Each command is implemented as an async function that takes a CommandContext.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use tally_config::{ConfigLayering, ConfigLoader, ConfigSource, TallyToml};
use tally_core::error::{TallyError, TallyResult};
use tally_registry::{ClientOptions, RegistryClient, RegistryUrl, RetryConfig};
use tracing::{debug, info};

pub mod ctime;
pub mod list;
pub mod report;

#[cfg(test)]
mod tests;

use crate::{output::OutputHandler, Commands, GlobalOptions};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: PathBuf,
    pub output: OutputHandler,
    pub config: TallyToml,
    pub client: Arc<RegistryClient>,
}

impl CommandContext {
    /// Load configuration, apply overrides and build the registry client
    pub async fn new(global: &GlobalOptions) -> TallyResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| TallyError::io("Failed to get current directory".to_string(), e))?;

        let explicit = global
            .config
            .clone()
            .map(|path| {
                Utf8PathBuf::try_from(path).map_err(|e| TallyError::ConfigValidation {
                    field: "config".to_string(),
                    reason: format!("Config path is not valid UTF-8: {}", e),
                })
            })
            .transpose()?;
        let loader = ConfigLoader::new(utf8_cwd(&cwd)?);
        let (base, source) = loader.load(explicit.as_deref()).await?;
        match &source {
            ConfigSource::Defaults => debug!("using default configuration"),
            other => debug!(source = ?other, "loaded configuration"),
        }

        let config = ConfigLayering::merge_configs(
            base,
            &ConfigLayering::collect_env_overrides(),
            &cli_overrides(global),
        )?;

        Self::from_config(cwd, config)
    }

    /// Build a context from an already merged configuration
    pub fn from_config(cwd: PathBuf, config: TallyToml) -> TallyResult<Self> {
        let defaults = ClientOptions::default();
        let options = ClientOptions {
            registry: RegistryUrl::parse(&config.registry.url)?,
            timeout: Duration::from_secs(config.registry.timeout_secs),
            user_agent: config.registry.user_agent.clone().unwrap_or(defaults.user_agent),
            retry: RetryConfig {
                max_retries: config.registry.max_retries,
                ..RetryConfig::default()
            },
        };
        let client = Arc::new(RegistryClient::with_options(options)?);

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            config,
            client,
        })
    }

    /// Package index the commands talk to
    pub fn registry(&self) -> &RegistryUrl {
        self.client.registry()
    }
}

fn utf8_cwd(cwd: &std::path::Path) -> TallyResult<Utf8PathBuf> {
    Utf8PathBuf::try_from(cwd.to_path_buf()).map_err(|e| TallyError::ConfigValidation {
        field: "cwd".to_string(),
        reason: format!("Working directory is not valid UTF-8: {}", e),
    })
}

fn cli_overrides(global: &GlobalOptions) -> HashMap<String, String> {
    let mut overrides = HashMap::new();
    if let Some(registry) = &global.registry {
        overrides.insert("registry".to_string(), registry.clone());
    }
    if let Some(concurrency) = global.concurrency {
        overrides.insert("concurrency".to_string(), concurrency.to_string());
    }
    overrides
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> TallyResult<()> {
    match command {
        Commands::Report { retry_passes, pretty } => {
            info!("Building growth report (retry_passes: {:?})", retry_passes);
            report::execute(retry_passes, pretty, ctx).await
        }
        Commands::Ctime { names } => {
            info!("Looking up {} packages", names.len());
            ctime::execute(names, ctx).await
        }
        Commands::List { count } => {
            info!("Listing catalog (count: {})", count);
            list::execute(count, ctx).await
        }
        Commands::Version => show_version(ctx).await,
    }
}

async fn show_version(ctx: &CommandContext) -> TallyResult<()> {
    let version = env!("CARGO_PKG_VERSION");
    let build_date = env!("BUILD_DATE");
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.data(&format!("tally v{}", version));
    ctx.output.info(&format!("Built: {}", build_date));
    ctx.output.info(&format!("Target: {}", target));
    ctx.output.info(&format!("Rust: {}", env!("RUSTC_VERSION")));
    ctx.output.info(&format!("Registry: {}", ctx.registry().as_str()));

    Ok(())
}
