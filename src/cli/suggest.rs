//! Suggest CLI command handler

use crate::cli::print_json;
use crate::core::context::AppContext;
use crate::error::{PrAgentError, Result};
use crate::server::tools::{parse_change_type, SuggestionReport};

/// Handle `pr-agent suggest`
pub async fn handle_suggest(
    ctx: &AppContext,
    base: Option<String>,
    change_type: Option<String>,
    top: Option<usize>,
) -> Result<()> {
    if top == Some(0) {
        return Err(PrAgentError::InvalidInput(
            "--top must be at least 1".to_string(),
        ));
    }

    // Diff text feeds keyword matching
    let request = ctx.collect_request(base, true, None);
    let summary = ctx.analyze(&request).await?;

    let (hint, hint_warning) = parse_change_type(change_type.as_deref());
    let mut suggestions = ctx.suggest(&summary, hint);
    if let Some(top) = top {
        suggestions.truncate(top);
    }

    let mut report = SuggestionReport::new(ctx, &summary.base_ref, &suggestions);
    report.warnings.extend(hint_warning);
    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    print_json(&report)
}
