mod common;

use assert_cmd::Command;
use common::Fixture;
use serde_json::{json, Value};
use tempfile::TempDir;

fn session(fixture: &Fixture, config: &TempDir, messages: &[Value]) -> Vec<Value> {
    let input: String = messages.iter().map(|m| format!("{m}\n")).collect();

    let output = Command::cargo_bin("pr-agent")
        .unwrap()
        .env_remove("PR_AGENT_TEMPLATES_DIR")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config.path().join("config.toml"))
        .arg("--repo")
        .arg(fixture.path())
        .arg("serve")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn tool_payload(response: &Value) -> Value {
    serde_json::from_str(response["result"]["content"][0]["text"].as_str().unwrap()).unwrap()
}

#[test]
fn scripted_session_analyzes_and_suggests() {
    let fixture = Fixture::with_feature_work();
    let config = TempDir::new().unwrap();

    let replies = session(
        &fixture,
        &config,
        &[
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {"protocolVersion": "2025-03-26", "capabilities": {},
                           "clientInfo": {"name": "script", "version": "0"}}
            }),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
            json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {"name": "analyze_file_changes",
                           "arguments": {"base_branch": "main", "include_diff": true, "max_diff_lines": 5}}
            }),
            json!({
                "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": {"name": "suggest_template", "arguments": {"base_branch": "main"}}
            }),
        ],
    );

    // The notification gets no reply
    assert_eq!(replies.len(), 4);
    let ids: Vec<i64> = replies.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    assert_eq!(replies[0]["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(replies[1]["result"]["tools"].as_array().unwrap().len(), 3);

    let summary = tool_payload(&replies[2]);
    assert_eq!(summary["base_ref"], "main");
    assert_eq!(summary["files_changed"].as_array().unwrap().len(), 3);
    assert_eq!(summary["diff"]["shown_lines"], 5);

    let report = tool_payload(&replies[3]);
    assert_eq!(report["suggestions"][0]["template_id"], "bugfix");
    assert_eq!(report["suggestions"].as_array().unwrap().len(), 7);
}

#[test]
fn tool_failures_are_reported_in_the_result() {
    let fixture = Fixture::with_feature_work();
    let config = TempDir::new().unwrap();

    let replies = session(
        &fixture,
        &config,
        &[json!({
            "jsonrpc": "2.0", "id": "a", "method": "tools/call",
            "params": {"name": "analyze_file_changes", "arguments": {"base_branch": "nope"}}
        })],
    );

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], "a");
    assert_eq!(replies[0]["result"]["isError"], true);
    let payload = tool_payload(&replies[0]);
    assert_eq!(payload["error"], "UnknownReference");
    assert_eq!(payload["reference"], "nope");
}

#[test]
fn malformed_lines_do_not_stop_the_server() {
    let fixture = Fixture::new();
    let config = TempDir::new().unwrap();

    let replies = session(
        &fixture,
        &config,
        &[
            json!("not an object"),
            json!({"jsonrpc": "2.0", "id": 9, "method": "ping"}),
        ],
    );

    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["error"]["code"], -32600);
    assert_eq!(replies[1]["id"], 9);
    assert_eq!(replies[1]["result"], json!({}));
}
