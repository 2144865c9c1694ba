//! `local-command` nodes: newline-delimited JSON-RPC over a child's stdin/stdout.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, trace};

use switchyard_core::{Error, NodeSession};
use switchyard_mcp::codec;
use switchyard_mcp::JsonRpcResponse;

/// A spawned node process, owned by one logical session.
///
/// The child is killed on [`NodeSession::close`] and, failing that, on drop.
pub struct StdioSession {
    command: String,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    timeout: Duration,
    closed: bool,
}

impl StdioSession {
    /// Spawn the node process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the process cannot be started.
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let spawn_error = |reason: String| Error::Spawn {
            command: command.to_string(),
            reason,
        };

        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_error("failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error("failed to capture stdout".to_string()))?;

        debug!(command, pid = child.id(), "spawned node process");

        Ok(Self {
            command: command.to_string(),
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            timeout,
            closed: false,
        })
    }

    async fn write_line(&mut self, mut payload: Vec<u8>) -> Result<(), Error> {
        payload.push(b'\n');
        self.stdin
            .write_all(&payload)
            .await
            .map_err(|e| Error::transport(format!("failed to write to '{}': {e}", self.command)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| Error::transport(format!("failed to write to '{}': {e}", self.command)))
    }

    /// Read lines until the response to `expected_id` arrives.
    ///
    /// Blank lines, non-JSON output, notifications and requests from the node
    /// are skipped.
    async fn read_response(&mut self, expected_id: &Value) -> Result<Value, Error> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|e| Error::transport(format!("failed to read from '{}': {e}", self.command)))?
                .ok_or_else(|| Error::transport(format!("'{}' closed its stdout", self.command)))?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Ok(message) = serde_json::from_str::<Value>(trimmed) else {
                trace!(command = %self.command, line = trimmed, "ignoring non-JSON output");
                continue;
            };
            if message.get("method").is_some() || message.get("id").is_none_or(Value::is_null) {
                trace!(command = %self.command, raw = trimmed, "ignoring message from node");
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(message)
                .map_err(|e| Error::MalformedResponse(e.to_string()))?;
            return codec::into_result(response, expected_id);
        }
    }
}

#[async_trait]
impl NodeSession for StdioSession {
    async fn request(&mut self, method: &str, params: Value) -> Result<Value, Error> {
        let encoded = codec::encode_request(method, params)?;
        trace!(command = %self.command, method, id = %encoded.id, "gateway -> node");
        self.write_line(encoded.body).await?;

        let timeout = self.timeout;
        let command = self.command.clone();
        tokio::time::timeout(timeout, self.read_response(&encoded.id))
            .await
            .map_err(|_| {
                Error::transport(format!(
                    "'{command}' did not answer {method} within {}ms",
                    timeout.as_millis()
                ))
            })?
    }

    async fn notify(&mut self, method: &str, params: Value) -> Result<(), Error> {
        let payload = codec::encode_notification(method, params)?;
        trace!(command = %self.command, method, "gateway -> node (notification)");
        self.write_line(payload).await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.child.kill().await {
            debug!(command = %self.command, error = %e, "failed to kill node process");
        }
    }
}
