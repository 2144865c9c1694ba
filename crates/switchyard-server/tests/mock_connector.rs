use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use switchyard_core::{Error, NodeConnector, NodeDescriptor, NodeSession};

/// Session bookkeeping shared by a connector and every session it opens.
#[derive(Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

/// In-memory nodes. Every node serves the same small tool set; the node named
/// `offline` refuses connections.
#[derive(Default)]
pub struct MockConnector {
    pub counters: Arc<Counters>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeConnector for MockConnector {
    async fn connect(&self, node: &NodeDescriptor) -> Result<Box<dyn NodeSession>, Error> {
        if node.id.as_str() == "offline" {
            return Err(Error::Transport {
                status: None,
                body: "connection refused".to_string(),
            });
        }

        let counters = Arc::clone(&self.counters);
        counters.opened.fetch_add(1, Ordering::SeqCst);
        let active = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            node: node.id.to_string(),
            counters,
            closed: false,
        }))
    }
}

pub struct MockSession {
    node: String,
    counters: Arc<Counters>,
    closed: bool,
}

fn text(value: impl Into<String>) -> Value {
    json!({"content": [{"type": "text", "text": value.into()}]})
}

#[async_trait]
impl NodeSession for MockSession {
    async fn request(&mut self, method: &str, params: Value) -> Result<Value, Error> {
        match method {
            "tools/list" => Ok(json!({"tools": [
                {"name": "math_add", "description": "Add two numbers.", "inputSchema": {
                    "type": "object",
                    "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                    "required": ["a", "b"]
                }},
                {"name": "whoami", "input_schema": {"type": "object"}, "output_schema": {"type": "string"}},
                {"name": "ping"},
                {"bogus": true}
            ]})),
            "tools/call" => {
                let args = &params["arguments"];
                match params["name"].as_str().unwrap_or_default() {
                    "math_add" => {
                        let sum = args["a"].as_i64().unwrap_or_default()
                            + args["b"].as_i64().unwrap_or_default();
                        Ok(text(json!({"sum": sum}).to_string()))
                    }
                    "whoami" => {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(text(self.node.clone()))
                    }
                    "echo_args" => Ok(json!({"echo": args})),
                    "fail" => Ok(json!({
                        "content": [{"type": "text", "text": "disk full"}],
                        "isError": true
                    })),
                    "quota" => Err(Error::Remote {
                        code: -32001,
                        message: "quota exceeded".to_string(),
                        data: Some(json!({"retry_after": 30})),
                    }),
                    "garbled" => Err(Error::EmptyStream),
                    other => Err(Error::Remote {
                        code: -32602,
                        message: format!("Unknown tool: {other}"),
                        data: None,
                    }),
                }
            }
            other => Err(Error::Remote {
                code: -32601,
                message: format!("Method not found: {other}"),
                data: None,
            }),
        }
    }

    async fn notify(&mut self, _method: &str, _params: Value) -> Result<(), Error> {
        Ok(())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.counters.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
