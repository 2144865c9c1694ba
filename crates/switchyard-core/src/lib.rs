pub mod config;
pub mod error;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::Error;
pub use registry::NodeRegistry;
pub use traits::{with_node_connection, NodeConnector, NodeSession};
pub use types::{
    ConnectionKind, NodeDescriptor, NodeId, NodeList, NodeSummary, NodeTarget, NodeTools,
    RejectedCall, ToolCallOutcome, ToolCallResult, ToolDescriptor,
};
