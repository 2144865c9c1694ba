//! HTTP surface of the switchyard gateway: the MCP endpoint, the legacy SSE
//! transport and the routing [`gateway::Gateway`] behind them.

pub mod app_state;
pub mod config;
pub mod gateway;
pub mod handlers;
pub mod router;
pub mod session;
