use switchyard_core::ToolDescriptor;

pub const TOOL_LIST_NODES: &str = "list_nodes";
pub const TOOL_LIST_NODE_TOOLS: &str = "list_node_tools";
pub const TOOL_CALL_NODE_TOOL: &str = "call_node_tool";

/// The tools the gateway itself exposes over MCP.
pub struct GatewayTools;

impl GatewayTools {
    /// Return the list of tool definitions for the MCP `tools/list` method.
    #[must_use]
    pub fn definitions() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor {
                name: TOOL_LIST_NODES.to_string(),
                description: "List the configured MCP nodes with their connection type, description and tags.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {}
                }),
                output_schema: None,
            },
            ToolDescriptor {
                name: TOOL_LIST_NODE_TOOLS.to_string(),
                description: "List the tools exposed by a specific node.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "node_id": {
                            "type": "string",
                            "description": "Id of the node, as returned by list_nodes"
                        }
                    },
                    "required": ["node_id"]
                }),
                output_schema: None,
            },
            ToolDescriptor {
                name: TOOL_CALL_NODE_TOOL.to_string(),
                description: "Call a tool on a specific node and return its result.".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "node_id": {
                            "type": "string",
                            "description": "Id of the node, as returned by list_nodes"
                        },
                        "tool_name": {
                            "type": "string",
                            "description": "Name of the tool, as returned by list_node_tools"
                        },
                        "arguments": {
                            "type": "object",
                            "description": "Arguments passed to the tool (defaults to an empty object)"
                        }
                    },
                    "required": ["node_id", "tool_name"]
                }),
                output_schema: None,
            },
        ]
    }
}
