//! Downstream client factory: one fresh MCP session per gateway call, over
//! HTTP for `remote-url` nodes or a child process for `local-command` nodes.

pub mod connector;
pub mod http;
pub mod stdio;

pub use connector::{initialize, Connector, DEFAULT_UPSTREAM_TIMEOUT};
pub use http::HttpSession;
pub use stdio::StdioSession;
