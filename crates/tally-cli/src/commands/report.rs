//! `tally report` command implementation.
//!
//! Lists the catalog, fetches every project's earliest upload time, retries
//! the unresolved ones and prints the cumulative growth report as JSON.

use std::sync::Arc;
use std::time::Instant;

use tally_core::error::{TallyError, TallyResult};
use tally_index::{CatalogIndex, Report};
use tally_registry::Transport;
use tracing::info;

use super::CommandContext;

/// Execute the `tally report` command
pub async fn execute(retry_passes: Option<u32>, pretty: bool, ctx: &CommandContext) -> TallyResult<()> {
    let start_time = Instant::now();

    ctx.output.step("🔍", &format!("Listing packages on {}", ctx.registry().as_str()));
    let index = discover(ctx).await?;

    ctx.output.step(
        "📥",
        &format!("Fetching metadata for {} packages ({} at a time)", index.len(), index.concurrency()),
    );
    let passes = retry_passes.unwrap_or(ctx.config.fetch.retry_passes);
    let report = collect(&index, passes).await;

    let json = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| TallyError::io("Failed to serialize report".to_string(), e.into()))?;
    ctx.output.data(&json);

    print_diagnostics(&index, ctx);
    ctx.output.success(&format!(
        "Reported {} packages over {} days in {:.2}s",
        report.total(),
        report.len(),
        start_time.elapsed().as_secs_f64()
    ));

    Ok(())
}

/// Build an index over the registry's full catalog
pub async fn discover(ctx: &CommandContext) -> TallyResult<CatalogIndex> {
    let transport: Arc<dyn Transport> = ctx.client.clone();
    CatalogIndex::discover(
        ctx.client.as_ref(),
        transport,
        ctx.registry().clone(),
        ctx.config.fetch.concurrency,
    )
    .await
}

/// Fetch everything, retry unresolved packages up to `passes` times, build the report
pub async fn collect(index: &CatalogIndex, passes: u32) -> Report {
    index.fetch_all().await;

    for pass in 1..=passes {
        let summary = index.summary();
        if summary.resolved == summary.total {
            break;
        }
        info!(pass, unresolved = summary.total - summary.resolved, "retry pass");
        index.retry().await;
    }

    index.report().await
}

fn print_diagnostics(index: &CatalogIndex, ctx: &CommandContext) {
    let summary = index.summary();
    ctx.output.info(&format!(
        "{} resolved, {} HTTP errors, {} failed, {} without files",
        summary.resolved, summary.http_errors, summary.parse_errors, summary.empty
    ));

    if summary.parse_errors > 0 {
        ctx.output.warn(&format!(
            "{} packages could not be fetched or parsed; rerun with -v for details",
            summary.parse_errors
        ));
    }
}
