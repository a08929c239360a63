//! `tally list` command implementation.

use tally_core::error::TallyResult;
use tally_registry::CatalogSource;

use super::CommandContext;

/// Execute the `tally list` command
pub async fn execute(count: bool, ctx: &CommandContext) -> TallyResult<()> {
    let names = ctx.client.list_names().await?;

    if count {
        ctx.output.data(&names.len().to_string());
    } else {
        for name in &names {
            ctx.output.data(name);
        }
    }

    Ok(())
}
