//! `tally ctime` command implementation.
//!
//! Looks up the earliest upload time of specific packages without listing
//! the whole catalog.

use std::sync::Arc;

use tally_core::error::TallyResult;
use tally_index::CatalogIndex;
use tally_registry::Transport;

use super::CommandContext;

/// Execute the `tally ctime` command
pub async fn execute(names: Vec<String>, ctx: &CommandContext) -> TallyResult<()> {
    let transport: Arc<dyn Transport> = ctx.client.clone();
    let index = CatalogIndex::with_concurrency(
        names,
        transport,
        ctx.registry().clone(),
        ctx.config.fetch.concurrency,
    );

    for line in lookup(&index).await {
        ctx.output.data(&line);
    }

    Ok(())
}

/// One `name<TAB>outcome` line per package, in the order given
pub async fn lookup(index: &CatalogIndex) -> Vec<String> {
    let results = index.fetch_all().await;

    index
        .names()
        .iter()
        .zip(results)
        .map(|(name, resolved)| match resolved {
            Some(timestamp) => format!("{}\t{}", name, timestamp.to_rfc3339()),
            None => format!("{}\tnone ({})", name, describe_unresolved(index, name)),
        })
        .collect()
}

fn describe_unresolved(index: &CatalogIndex, name: &str) -> String {
    if let Some((_, status)) = index.http_errors().into_iter().find(|(n, _)| n == name) {
        return format!("HTTP {}", status);
    }
    if let Some((_, error)) = index.parse_errors().into_iter().find(|(n, _)| n == name) {
        return error.to_string();
    }
    if index.empties().iter().any(|n| n == name) {
        return "no release files".to_string();
    }
    "not fetched".to_string()
}
