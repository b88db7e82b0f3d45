//! MCP server over stdio
//!
//! Reads newline-delimited JSON-RPC messages, handles each one to
//! completion, and writes the reply before reading the next.

pub mod protocol;
pub mod tools;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::core::context::AppContext;
use crate::error::Result;
use protocol::*;

/// Serve the host on this process's stdin and stdout until EOF
pub async fn serve(ctx: &AppContext) -> Result<()> {
    tracing::info!("MCP server ready on stdio");
    serve_io(ctx, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Serve one message stream; returns when the reader is exhausted
pub async fn serve_io<R, W>(ctx: &AppContext, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                handle_message(ctx, trimmed).await
            }
            Err(e) => {
                tracing::warn!("Dropping line that is not UTF-8: {}", e);
                Some(error_value(None, ERR_PARSE, format!("Parse error: {e}")))
            }
        };

        if let Some(response) = response {
            let mut bytes = serde_json::to_vec(&response)?;
            bytes.push(b'\n');
            writer.write_all(&bytes).await?;
            writer.flush().await?;
        }
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

/// Handle one raw message; notifications produce no reply
pub async fn handle_message(ctx: &AppContext, raw: &str) -> Option<Value> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            return Some(error_value(None, ERR_PARSE, format!("Parse error: {e}")));
        }
    };

    let id_hint = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    // A null id is still a request; only an absent id marks a notification
    if value.get("id").is_some_and(Value::is_null) {
        return Some(error_value(
            None,
            ERR_INVALID_REQUEST,
            "Request id must be a string or an integer".to_string(),
        ));
    }

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Some(error_value(
                id_hint,
                ERR_INVALID_REQUEST,
                format!("Invalid JSON-RPC: {e}"),
            ));
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(error_value(
            request.id,
            ERR_INVALID_REQUEST,
            format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
        ));
    }

    let Some(id) = request.id else {
        tracing::debug!("Notification: {}", request.method);
        return None;
    };

    let result = dispatch_method(ctx, &request.method, request.params).await;
    Some(match result {
        Ok(result) => serde_json::to_value(JsonRpcResponse::new(id, result)).unwrap_or_default(),
        Err((code, message)) => error_value(Some(id), code, message),
    })
}

async fn dispatch_method(
    ctx: &AppContext,
    method: &str,
    params: Option<Value>,
) -> std::result::Result<Value, (i64, String)> {
    match method {
        "initialize" => handle_initialize(params),
        "ping" => Ok(json!({})),
        "tools/list" => to_result(ListToolsResult {
            tools: tools::definitions(),
        }),
        "tools/call" => {
            let params: CallToolParams = params
                .ok_or_else(|| (ERR_INVALID_PARAMS, "Missing params".to_string()))
                .and_then(|v| {
                    serde_json::from_value(v)
                        .map_err(|e| (ERR_INVALID_PARAMS, format!("Invalid tools/call params: {e}")))
                })?;
            to_result(tools::call(ctx, params).await?)
        }
        _ => Err((ERR_METHOD_NOT_FOUND, format!("Unknown method: {method}"))),
    }
}

fn handle_initialize(params: Option<Value>) -> std::result::Result<Value, (i64, String)> {
    let params: InitializeParams = match params {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| (ERR_INVALID_PARAMS, format!("Invalid initialize params: {e}")))?,
        None => InitializeParams::default(),
    };

    if let Some(client) = &params.client_info {
        tracing::info!("Client connected: {} {}", client.name, client.version);
    }

    to_result(InitializeResult {
        protocol_version: negotiate_protocol_version(params.protocol_version.as_deref()).to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        instructions: Some(
            "Call analyze_file_changes to inspect the working tree, then suggest_template \
             to pick a PR description template."
                .to_string(),
        ),
    })
}

fn to_result<T: serde::Serialize>(value: T) -> std::result::Result<Value, (i64, String)> {
    serde_json::to_value(value).map_err(|e| (ERR_INTERNAL, format!("Serialize error: {e}")))
}

fn error_value(id: Option<RequestId>, code: i64, message: String) -> Value {
    serde_json::to_value(JsonRpcErrorResponse::new(id, code, message)).unwrap_or_default()
}
