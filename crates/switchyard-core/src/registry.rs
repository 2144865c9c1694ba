use std::path::Path;

use crate::config::GatewayConfig;
use crate::error::Error;
use crate::types::NodeDescriptor;

/// Read-only view over the configured nodes, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: Vec<NodeDescriptor>,
}

impl NodeRegistry {
    /// Build a registry from descriptors. Node ids must be unique.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on a duplicate node id.
    pub fn new(nodes: Vec<NodeDescriptor>) -> Result<Self, Error> {
        for (i, node) in nodes.iter().enumerate() {
            if nodes[..i].iter().any(|n| n.id == node.id) {
                return Err(Error::Config(format!("duplicate node id '{}'", node.id)));
            }
        }
        Ok(Self { nodes })
    }

    /// Build a registry from a parsed configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any node entry is invalid.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, Error> {
        Self::new(config.nodes()?)
    }

    /// Load the configuration file at `path` and build a registry from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file is unreadable or invalid.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let registry = Self::from_config(&GatewayConfig::load(path)?)?;
        tracing::info!(
            path = %path.display(),
            nodes = registry.len(),
            "loaded node registry"
        );
        Ok(registry)
    }

    /// All nodes in configuration order.
    #[must_use]
    pub fn list_nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    /// Look up a node by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if no node has this id.
    pub fn resolve(&self, node_id: &str) -> Result<&NodeDescriptor, Error> {
        self.nodes
            .iter()
            .find(|n| n.id.as_str() == node_id)
            .ok_or_else(|| Error::UnknownNode(node_id.into()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
