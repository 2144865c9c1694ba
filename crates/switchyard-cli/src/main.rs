use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use switchyard_mcp::tools::{TOOL_CALL_NODE_TOOL, TOOL_LIST_NODES, TOOL_LIST_NODE_TOOLS};

mod client;
mod legacy;

use client::{GatewayClient, Transport};

#[derive(Parser)]
#[command(name = "switchyard", about = "Switchyard CLI - browse and call tools behind an MCP gateway")]
struct Cli {
    /// Gateway base URL
    #[arg(long, env = "SWITCHYARD_URL", default_value = "http://localhost:8787")]
    gateway_url: String,

    /// Use the legacy SSE transport instead of streamable HTTP
    #[arg(long)]
    legacy_sse: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the configured nodes
    Nodes,

    /// List the tools a node exposes
    Tools {
        /// Node id, as shown by `nodes`
        node: String,
    },

    /// Call a tool on a node and print its result
    Call {
        /// Node id
        node: String,

        /// Tool name
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let transport = if cli.legacy_sse {
        Transport::LegacySse
    } else {
        Transport::StreamableHttp
    };
    let client = GatewayClient::new(&cli.gateway_url, transport);

    let output = match cli.command {
        Commands::Nodes => client.call_tool(TOOL_LIST_NODES, json!({})).await?,
        Commands::Tools { node } => {
            client
                .call_tool(TOOL_LIST_NODE_TOOLS, json!({ "node_id": node }))
                .await?
        }
        Commands::Call { node, tool, args } => {
            let mut arguments = json!({ "node_id": node, "tool_name": tool });
            if let Some(raw) = args {
                let parsed: Value =
                    serde_json::from_str(&raw).context("--args must be valid JSON")?;
                arguments["arguments"] = parsed;
            }
            client.call_tool(TOOL_CALL_NODE_TOOL, arguments).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
