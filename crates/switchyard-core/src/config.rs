use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::types::{NodeDescriptor, NodeId, NodeTarget};

/// Environment variable overriding the node configuration path.
pub const CONFIG_PATH_ENV: &str = "SWITCHYARD_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "mcp_config.json";

/// The `{ "mcpServers": { ... } }` document.
///
/// Entries are kept as raw JSON so that document order survives parsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: Map<String, Value>,
}

/// One entry under `mcpServers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    pub url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl GatewayConfig {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is not valid JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Build node descriptors in document order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an entry that is not an object or names
    /// neither a `url` nor a `command`.
    pub fn nodes(&self) -> Result<Vec<NodeDescriptor>, Error> {
        self.mcp_servers
            .iter()
            .map(|(id, raw)| {
                let cfg: NodeConfig = serde_json::from_value(raw.clone())
                    .map_err(|e| Error::Config(format!("node '{id}': {e}")))?;
                cfg.into_descriptor(NodeId::from(id.as_str()))
            })
            .collect()
    }
}

impl NodeConfig {
    fn into_descriptor(self, id: NodeId) -> Result<NodeDescriptor, Error> {
        let target = match (self.url, self.command) {
            (Some(url), _) => NodeTarget::RemoteUrl {
                url,
                headers: self.headers,
            },
            (None, Some(command)) => NodeTarget::LocalCommand {
                command,
                args: self.args,
                env: self.env,
            },
            (None, None) => {
                return Err(Error::Config(format!(
                    "node '{id}' needs either a url or a command"
                )))
            }
        };

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Ok(NodeDescriptor {
            id,
            target,
            description: self.description,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConnectionKind;

    #[test]
    fn parses_url_and_command_nodes() {
        let cfg = GatewayConfig::from_json_str(
            r#"{
                "mcpServers": {
                    "node_a": {
                        "url": "http://localhost:8001/mcp",
                        "description": "Math tools",
                        "tags": ["math", "math", "demo"]
                    },
                    "photos": {
                        "command": "python",
                        "args": ["photo_process.py"],
                        "env": {"LOG_LEVEL": "debug"}
                    }
                }
            }"#,
        )
        .unwrap();

        let nodes = cfg.nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id.as_str(), "node_a");
        assert_eq!(nodes[0].kind(), ConnectionKind::RemoteUrl);
        assert_eq!(nodes[0].tags, vec!["math", "demo"]);
        assert_eq!(nodes[1].kind(), ConnectionKind::LocalCommand);
        assert_eq!(nodes[1].description, "");
    }

    #[test]
    fn url_wins_over_command() {
        let cfg = GatewayConfig::from_json_str(
            r#"{"mcpServers": {"both": {"url": "http://x/mcp", "command": "node"}}}"#,
        )
        .unwrap();
        let nodes = cfg.nodes().unwrap();
        assert_eq!(nodes[0].kind(), ConnectionKind::RemoteUrl);
    }

    #[test]
    fn node_without_target_is_rejected() {
        let cfg =
            GatewayConfig::from_json_str(r#"{"mcpServers": {"empty": {"description": "?"}}}"#)
                .unwrap();
        let err = cfg.nodes().unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("empty")));
    }

    #[test]
    fn missing_servers_section_is_empty() {
        let cfg = GatewayConfig::from_json_str("{}").unwrap();
        assert!(cfg.nodes().unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_config_error() {
        assert!(matches!(
            GatewayConfig::from_json_str("{not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = GatewayConfig::load(Path::new("/nonexistent/switchyard.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/switchyard.json"));
    }
}
