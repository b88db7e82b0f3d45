//! Analyze CLI command handler

use crate::cli::print_json;
use crate::core::context::AppContext;
use crate::error::Result;

/// Handle `pr-agent analyze`
pub async fn handle_analyze(
    ctx: &AppContext,
    base: Option<String>,
    diff: bool,
    max_lines: Option<i64>,
) -> Result<()> {
    let request = ctx.collect_request(base, diff, max_lines);
    let summary = ctx.analyze(&request).await?;

    if summary.is_truncated() {
        tracing::info!("Diff truncated to {} lines", request.max_diff_lines);
    }
    print_json(&summary)
}
