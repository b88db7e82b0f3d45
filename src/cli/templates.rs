//! Templates CLI command handler

use crate::cli::print_json;
use crate::core::context::AppContext;
use crate::error::Result;
use crate::server::tools::TemplateListing;

/// Handle `pr-agent templates`
pub fn handle_templates(ctx: &AppContext) -> Result<()> {
    for warning in ctx.warnings() {
        eprintln!("Warning: {}", warning);
    }
    print_json(&TemplateListing::new(ctx))
}
