//! MCP tool definitions and handlers
//!
//! - `analyze_file_changes`: collect a change summary
//! - `get_pr_templates`: list the template catalog
//! - `suggest_template`: rank templates for an inline or freshly collected summary

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analysis::{ChangeSummary, CollectRequest};
use crate::core::context::AppContext;
use crate::error::{PrAgentError, Result};
use crate::server::protocol::{CallToolParams, CallToolResult, Tool, ERR_INVALID_PARAMS};
use crate::templates::{Category, CategoryHintScorer, SignalMatch, Suggestion, Template};

pub const ANALYZE_FILE_CHANGES: &str = "analyze_file_changes";
pub const GET_PR_TEMPLATES: &str = "get_pr_templates";
pub const SUGGEST_TEMPLATE: &str = "suggest_template";

/// Tools advertised by `tools/list`
pub fn definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: ANALYZE_FILE_CHANGES.to_string(),
            description: "Summarize the changes between a base branch and the working tree: \
                          changed files with line counts, commits not in the base, and \
                          optionally the unified diff (line-capped)."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "base_branch": {
                        "type": "string",
                        "description": "Reference to compare against (default: configured base branch)"
                    },
                    "include_diff": {
                        "type": "boolean",
                        "description": "Include the unified diff text",
                        "default": false
                    },
                    "max_diff_lines": {
                        "type": "integer",
                        "description": "Maximum diff lines to return; 0 or less returns no diff text"
                    },
                    "working_directory": {
                        "type": "string",
                        "description": "Directory inside the repository (default: server working directory)"
                    }
                }
            }),
        },
        Tool {
            name: GET_PR_TEMPLATES.to_string(),
            description: "List the available PR templates with their category, signals and content."
                .to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        Tool {
            name: SUGGEST_TEMPLATE.to_string(),
            description: "Rank PR templates for a change summary. Pass the output of \
                          analyze_file_changes as change_summary, or omit it to analyze \
                          the working tree against base_branch."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "change_summary": {
                        "type": "object",
                        "description": "A summary as returned by analyze_file_changes"
                    },
                    "base_branch": {
                        "type": "string",
                        "description": "Reference to analyze against when change_summary is omitted"
                    },
                    "change_type": {
                        "type": "string",
                        "description": "Type of change you identified (bug, feature, docs, refactor, test, performance, security, ...)"
                    },
                    "working_directory": {
                        "type": "string",
                        "description": "Directory inside the repository (default: server working directory)"
                    }
                }
            }),
        },
    ]
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeArgs {
    #[serde(default)]
    pub base_branch: Option<String>,
    #[serde(default)]
    pub include_diff: bool,
    #[serde(default)]
    pub max_diff_lines: Option<i64>,
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestArgs {
    #[serde(default)]
    pub change_summary: Option<ChangeSummary>,
    #[serde(default)]
    pub base_branch: Option<String>,
    #[serde(default)]
    pub change_type: Option<String>,
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct TemplateListing<'a> {
    pub templates: &'a [Template],
    pub warnings: Vec<String>,
}

impl<'a> TemplateListing<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self {
            templates: ctx.catalog().templates(),
            warnings: ctx.warnings(),
        }
    }
}

/// A suggestion with the template's content attached
#[derive(Debug, Serialize)]
pub struct SuggestionView<'a> {
    pub template_id: &'a str,
    pub title: &'a str,
    pub category: Category,
    pub score: f64,
    pub rationale: &'a str,
    pub matches: &'a [SignalMatch],
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SuggestionReport<'a> {
    pub base_ref: &'a str,
    pub suggestions: Vec<SuggestionView<'a>>,
    pub warnings: Vec<String>,
}

impl<'a> SuggestionReport<'a> {
    /// Report for ranked suggestions, with each template's content attached
    pub fn new(ctx: &'a AppContext, base_ref: &'a str, suggestions: &'a [Suggestion]) -> Self {
        Self {
            base_ref,
            suggestions: attach_content(ctx, suggestions),
            warnings: ctx.warnings(),
        }
    }
}

/// Structured body of a failed tool call
#[derive(Debug, Serialize)]
pub struct ToolError {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl From<&PrAgentError> for ToolError {
    fn from(err: &PrAgentError) -> Self {
        Self {
            error: err.kind(),
            message: err.to_string(),
            reference: err.reference(),
        }
    }
}

/// Run a `tools/call` request
///
/// Unknown tools and malformed arguments are protocol errors; failures
/// while running a tool are reported inside the result.
pub async fn call(
    ctx: &AppContext,
    params: CallToolParams,
) -> std::result::Result<CallToolResult, (i64, String)> {
    let arguments = params.arguments.unwrap_or_else(|| json!({}));
    tracing::info!("Tool call: {}", params.name);

    let outcome = match params.name.as_str() {
        ANALYZE_FILE_CHANGES => analyze_file_changes(ctx, parse_args(&params.name, arguments)?).await,
        GET_PR_TEMPLATES => get_pr_templates(ctx),
        SUGGEST_TEMPLATE => suggest_template(ctx, parse_args(&params.name, arguments)?).await,
        other => return Err((ERR_INVALID_PARAMS, format!("Unknown tool: {other}"))),
    };

    Ok(match outcome {
        Ok(value) => CallToolResult::text(to_text(&value)),
        Err(e) => {
            tracing::warn!("Tool {} failed: {}", params.name, e);
            CallToolResult::error(to_text(&json!(ToolError::from(&e))))
        }
    })
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    tool: &str,
    arguments: Value,
) -> std::result::Result<T, (i64, String)> {
    serde_json::from_value(arguments)
        .map_err(|e| (ERR_INVALID_PARAMS, format!("Invalid arguments for {tool}: {e}")))
}

fn to_text(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

async fn analyze_file_changes(ctx: &AppContext, args: AnalyzeArgs) -> Result<Value> {
    let request = ctx.collect_request(args.base_branch, args.include_diff, args.max_diff_lines);
    let summary = ctx
        .collector_for(args.working_directory)
        .collect(&request)
        .await?;
    Ok(serde_json::to_value(summary)?)
}

fn get_pr_templates(ctx: &AppContext) -> Result<Value> {
    Ok(serde_json::to_value(TemplateListing::new(ctx))?)
}

async fn suggest_template(ctx: &AppContext, args: SuggestArgs) -> Result<Value> {
    let summary = match args.change_summary {
        Some(summary) => summary,
        None => {
            let request = CollectRequest {
                base_ref: args.base_branch,
                include_diff: true,
                max_diff_lines: ctx.config().max_diff_lines,
            };
            ctx.collector_for(args.working_directory)
                .collect(&request)
                .await?
        }
    };

    let (hint, hint_warning) = parse_change_type(args.change_type.as_deref());
    let suggestions = ctx.suggest(&summary, hint);
    let mut report = SuggestionReport::new(ctx, &summary.base_ref, &suggestions);
    report.warnings.extend(hint_warning);
    Ok(serde_json::to_value(report)?)
}

/// The scorer for a host-supplied change type, or a warning when it names no category
pub fn parse_change_type(
    change_type: Option<&str>,
) -> (Option<CategoryHintScorer>, Option<String>) {
    match change_type.map(str::trim).filter(|t| !t.is_empty()) {
        None => (None, None),
        Some(raw) => match CategoryHintScorer::parse(raw) {
            Some(hint) => (Some(hint), None),
            None => (
                None,
                Some(format!("InvalidInput: change_type '{raw}' names no category; ignored")),
            ),
        },
    }
}

fn attach_content<'a>(ctx: &'a AppContext, suggestions: &'a [Suggestion]) -> Vec<SuggestionView<'a>> {
    suggestions
        .iter()
        .filter_map(|s| {
            let template = ctx.catalog().get(&s.template_id)?;
            Some(SuggestionView {
                template_id: &s.template_id,
                title: &template.title,
                category: s.category,
                score: s.score,
                rationale: &s.rationale,
                matches: &s.matches,
                content: &template.content,
            })
        })
        .collect()
}
