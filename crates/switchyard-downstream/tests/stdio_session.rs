#![cfg(unix)]

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::json;

use switchyard_core::{with_node_connection, Error, NodeConnector, NodeDescriptor, NodeId, NodeTarget};
use switchyard_downstream::Connector;
use switchyard_mcp::normalize::{normalize, normalize_tools, ProviderResponse};

/// A tiny MCP node in POSIX sh. It chatters a notification before the
/// handshake reply, to check that unrelated lines are skipped.
const ECHO_NODE: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\("[^"]*"\).*/\1/p')
  [ -z "$id" ] && continue
  case "$line" in
    *'"method":"initialize"'*)
      echo 'not json at all'
      echo '{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}'
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"echo-node","version":"0.1.0"}}}\n' "$id"
      ;;
    *'"method":"tools/list"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo","description":"Echo a greeting.","inputSchema":{"type":"object"}}]}}\n' "$id"
      ;;
    *'"method":"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"hello from %s"}]}}\n' "$id" "$NODE_NAME"
      ;;
    *)
      printf '{"jsonrpc":"2.0","id":%s,"error":{"code":-32601,"message":"Method not found"}}\n' "$id"
      ;;
  esac
done
"#;

/// Records its pid in `$1`, completes the handshake, then never answers.
const STALLED_NODE: &str = r#"
echo $$ > "$1"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/^{"jsonrpc":"2.0","id":\("[^"]*"\).*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}}}}\n' "$id"
      ;;
  esac
done
"#;

fn command_node(command: &str, args: &[&str]) -> NodeDescriptor {
    NodeDescriptor {
        id: NodeId::from("local"),
        target: NodeTarget::LocalCommand {
            command: command.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            env: BTreeMap::from([("NODE_NAME".to_string(), "sh".to_string())]),
        },
        description: String::new(),
        tags: Vec::new(),
    }
}

fn echo_node() -> NodeDescriptor {
    command_node("sh", &["-c", ECHO_NODE])
}

fn connector(timeout_ms: u64) -> Connector {
    Connector::new(Duration::from_millis(timeout_ms)).unwrap()
}

#[tokio::test]
async fn handshake_then_list_tools() {
    let tools = with_node_connection(&connector(5000), &echo_node(), |session| {
        Box::pin(async move { normalize_tools(session.request("tools/list", json!({})).await?) })
    })
    .await
    .unwrap();

    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["echo"]);
    assert_eq!(tools[0].description, "Echo a greeting.");
}

#[tokio::test]
async fn env_reaches_the_process() {
    let result = with_node_connection(&connector(5000), &echo_node(), |session| {
        Box::pin(async move {
            let raw = session
                .request("tools/call", json!({"name": "echo", "arguments": {}}))
                .await?;
            Ok(normalize(ProviderResponse::from_value(raw)))
        })
    })
    .await
    .unwrap();

    assert_eq!(result, json!({"text": "hello from sh"}));
}

#[tokio::test]
async fn unknown_method_is_remote_error() {
    let err = with_node_connection(&connector(5000), &echo_node(), |session| {
        Box::pin(async move { session.request("resources/list", json!({})).await })
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Remote { code: -32601, .. }));
}

#[tokio::test]
async fn missing_command_is_spawn_error() {
    let err = connector(5000)
        .connect(&command_node("/nonexistent/switchyard-node", &[]))
        .await
        .err()
        .unwrap();

    match err {
        Error::Spawn { command, .. } => assert_eq!(command, "/nonexistent/switchyard-node"),
        other => panic!("expected spawn error, got {other:?}"),
    }
}

#[tokio::test]
async fn exited_process_is_transport_error() {
    let err = connector(5000)
        .connect(&command_node("true", &[]))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, Error::Transport { status: None, .. }));
}

#[tokio::test]
async fn silent_process_times_out() {
    let started = std::time::Instant::now();
    let err = connector(100)
        .connect(&command_node("sleep", &["5"]))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, Error::Transport { .. }));
    assert!(started.elapsed() < Duration::from_secs(4));
}

/// Live and not a zombie, according to `ps`.
fn process_running(pid: &str) -> bool {
    std::process::Command::new("ps")
        .args(["-o", "stat=", "-p", pid])
        .output()
        .map(|out| {
            let stat = String::from_utf8_lossy(&out.stdout);
            out.status.success() && !stat.trim().is_empty() && !stat.trim().starts_with('Z')
        })
        .unwrap_or(false)
}

#[tokio::test]
async fn cancelled_call_kills_the_process() {
    let pid_file = std::env::temp_dir().join(format!("switchyard-stalled-{}.pid", std::process::id()));
    let pid_path = pid_file.to_string_lossy().into_owned();
    let node = command_node("sh", &["-c", STALLED_NODE, "sh", &pid_path]);
    let connector = connector(5000);

    let call = with_node_connection(&connector, &node, |session| {
        Box::pin(async move { session.request("tools/call", json!({"name": "echo"})).await })
    });
    let timed_out = tokio::time::timeout(Duration::from_millis(500), call).await;
    assert!(timed_out.is_err());

    let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
    let _ = std::fs::remove_file(&pid_file);

    let mut running = true;
    for _ in 0..50 {
        running = process_running(&pid);
        if !running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!running, "node process {pid} outlived the cancelled call");
}
